use crate::catalog::{ConversionClass, TypeKind, WellKnown};
use crate::context::ResolutionContext;
use crate::descriptor::MappingPair;
use crate::invoke::MethodInvokeDescriptor;
use crate::profile::HookKind;
use crate::Result;

use std::collections::HashMap;
use std::sync::RwLock;

/// How a value of one type becomes a value of another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// No conversion exists
    Impossible,

    /// Same type; the value is used as is
    Identity,

    /// The host converts without an explicit operation
    Implicit,

    /// An explicit invocation performs the conversion
    Invoke(MethodInvokeDescriptor),
}

impl Conversion {
    pub fn is_possible(&self) -> bool {
        !matches!(self, Conversion::Impossible)
    }

    pub fn invocation(&self) -> Option<&MethodInvokeDescriptor> {
        match self {
            Conversion::Invoke(invoke) => Some(invoke),
            _ => None,
        }
    }

    /// Direct assignment, no invocation needed.
    pub fn is_trivial(&self) -> bool {
        matches!(self, Conversion::Identity | Conversion::Implicit)
    }
}

/// Memo of conversions resolved with implicit conversions allowed.
#[derive(Debug, Default)]
pub(crate) struct ConversionCache {
    entries: RwLock<HashMap<MappingPair, Conversion>>,
}

impl ConversionCache {
    fn get(&self, pair: &MappingPair) -> Option<Conversion> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(pair).cloned()
    }

    fn insert_if_absent(&self, pair: MappingPair, conversion: Conversion) -> Conversion {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.entry(pair).or_insert(conversion).clone()
    }

    pub(crate) fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// Decides whether and how a value converts between two types.
pub struct ConversionMatcher<'a> {
    cx: &'a ResolutionContext<'a>,
}

impl<'a> ConversionMatcher<'a> {
    pub fn new(cx: &'a ResolutionContext<'a>) -> ConversionMatcher<'a> {
        ConversionMatcher { cx }
    }

    /// Resolves the conversion from `pair.from` to `pair.to`.
    ///
    /// With `allow_implicit` unset, conversions the host would perform
    /// implicitly are turned into explicit casts. Only results with
    /// `allow_implicit` set are cached.
    pub fn get_conversion(&self, pair: MappingPair, allow_implicit: bool) -> Result<Conversion> {
        self.cx.check_cancelled()?;

        if allow_implicit {
            if let Some(hit) = self.cx.conversion_cache().get(&pair) {
                return Ok(hit);
            }
        }

        let conversion = self.resolve(pair, allow_implicit)?;

        if allow_implicit {
            Ok(self
                .cx
                .conversion_cache()
                .insert_if_absent(pair, conversion))
        } else {
            Ok(conversion)
        }
    }

    fn resolve(&self, pair: MappingPair, allow_implicit: bool) -> Result<Conversion> {
        let catalog = self.cx.catalog();

        if let Some(hook) = self.cx.registry().hook(pair, HookKind::TypeMapping) {
            return Ok(Conversion::Invoke(hook));
        }

        if catalog.is_well_known(pair.to, WellKnown::Object) {
            return Ok(if allow_implicit {
                Conversion::Implicit
            } else {
                Conversion::Invoke(MethodInvokeDescriptor::cast(pair.to))
            });
        }

        if catalog.is_well_known(pair.to, WellKnown::String)
            && !catalog.is_well_known(pair.from, WellKnown::String)
        {
            return Ok(Conversion::Invoke(MethodInvokeDescriptor::stringify()));
        }

        if let Some(conversion) = self.collection_conversion(pair)? {
            return Ok(conversion);
        }

        if self.cx.descriptors().contains_generated(pair.from, pair.to) {
            return Ok(Conversion::Invoke(MethodInvokeDescriptor::generated_map(
                pair.from, pair.to,
            )));
        }

        if pair.from == pair.to {
            return Ok(Conversion::Identity);
        }

        Ok(match catalog.classify_conversion(pair.from, pair.to) {
            ConversionClass::None | ConversionClass::ExplicitUnboxing => Conversion::Impossible,
            ConversionClass::Implicit if allow_implicit => Conversion::Implicit,
            ConversionClass::Implicit => Conversion::Invoke(MethodInvokeDescriptor::cast(pair.to)),
            ConversionClass::Explicit => {
                // Host classification between two sequences is not trustworthy
                if catalog.sequence_of(pair.from).is_some() && catalog.sequence_of(pair.to).is_some() {
                    Conversion::Impossible
                } else {
                    Conversion::Invoke(MethodInvokeDescriptor::cast(pair.to))
                }
            }
        })
    }

    /// Element-wise mapping between two sequences, when a materializer for
    /// the target exists and the elements convert.
    fn collection_conversion(&self, pair: MappingPair) -> Result<Option<Conversion>> {
        let catalog = self.cx.catalog();

        let (Some(source), Some(_)) = (catalog.sequence_of(pair.from), catalog.sequence_of(pair.to))
        else {
            return Ok(None);
        };

        let target = catalog.describe(pair.to)?;

        let (target_element, materializer) = match target.kind {
            TypeKind::Array(element) => (element, MethodInvokeDescriptor::array_materialize()),
            _ => {
                let Some(generic) = &target.generic else {
                    return Ok(None);
                };
                let Some(element) = generic.single_argument() else {
                    return Ok(None);
                };
                let Some(converter) = self.cx.registry().collection_converter(generic.definition)
                else {
                    return Ok(None);
                };
                (element, converter)
            }
        };

        let element = self.get_conversion(MappingPair::new(source.element, target_element), false)?;
        if !element.is_possible() {
            return Ok(None);
        }

        Ok(Some(Conversion::Invoke(MethodInvokeDescriptor::collection(
            source.element,
            target_element,
            element,
            materializer,
        ))))
    }
}
