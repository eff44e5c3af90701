use objmap_core::catalog::{
    Constructor, ConversionClass, Member, Primitive, Sequence, TypeInfo, WellKnown,
};
use objmap_core::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn class(catalog: &mut MemoryCatalog, name: &str, members: &[(&str, TypeId)]) -> TypeId {
    let ty = catalog.define_class(name);
    for (member_name, member_ty) in members {
        catalog
            .add_member(ty, Member::property(*member_name, *member_ty))
            .unwrap();
    }
    catalog
        .add_constructor(ty, Constructor::new("default", vec![]))
        .unwrap();
    ty
}

/// Delegates to a [`MemoryCatalog`] but fails to list the members of one type.
struct FaultyCatalog {
    inner: MemoryCatalog,
    broken: TypeId,
}

impl TypeCatalog for FaultyCatalog {
    fn describe(&self, ty: TypeId) -> Result<&TypeInfo> {
        self.inner.describe(ty)
    }

    fn public_constructors(&self, ty: TypeId) -> Result<Vec<Constructor>> {
        self.inner.public_constructors(ty)
    }

    fn public_members(&self, ty: TypeId) -> Result<Vec<Member>> {
        if ty == self.broken {
            objmap_core::bail!("member table for {} is corrupt", self.inner.type_name(ty));
        }
        self.inner.public_members(ty)
    }

    fn classify_conversion(&self, from: TypeId, to: TypeId) -> ConversionClass {
        self.inner.classify_conversion(from, to)
    }

    fn sequence_of(&self, ty: TypeId) -> Option<Sequence> {
        self.inner.sequence_of(ty)
    }

    fn is_sequence_definition(&self, definition: TypeId) -> bool {
        self.inner.is_sequence_definition(definition)
    }

    fn well_known(&self, which: WellKnown) -> Option<TypeId> {
        self.inner.well_known(which)
    }
}

struct Sample {
    catalog: MemoryCatalog,
    a: TypeId,
    b: TypeId,
    x: TypeId,
    y: TypeId,
}

fn sample() -> Sample {
    let mut catalog = MemoryCatalog::new();
    let i32 = catalog.primitive(Primitive::I32);
    let a = class(&mut catalog, "A", &[("Id", i32)]);
    let b = class(&mut catalog, "B", &[("Id", i32)]);
    let x = class(&mut catalog, "X", &[("Id", i32)]);
    let y = class(&mut catalog, "Y", &[("Id", i32), ("Extra", i32)]);
    Sample { catalog, a, b, x, y }
}

#[test]
fn groups_follow_first_registration_with_instance_less_first() {
    let s = sample();
    let input = PassInput::new()
        .request(MappingRequest::onto(s.b, s.x))
        .request(MappingRequest::new(s.a, s.x))
        .request(MappingRequest::new(s.b, s.y));

    let output = resolve(&s.catalog, &Config::default(), &input, &CancellationToken::new()).unwrap();

    let shape: Vec<(TypeId, Vec<(TypeId, bool)>)> = output
        .groups
        .iter()
        .map(|g| {
            (
                g.source,
                g.plans
                    .iter()
                    .map(|p| (p.target, p.without_target_instance))
                    .collect(),
            )
        })
        .collect();

    assert_eq!(
        shape,
        [
            (s.b, vec![(s.y, true), (s.x, false)]),
            (s.a, vec![(s.x, true)]),
        ]
    );
}

#[test]
fn identical_input_yields_identical_output() {
    let s = sample();
    let input = PassInput::new()
        .request(MappingRequest::new(s.a, s.y).at(RequestSite::new(1, 1)))
        .request(MappingRequest::onto(s.b, s.x).at(RequestSite::new(2, 1)))
        .request(MappingRequest::new(s.b, s.y).at(RequestSite::new(3, 1)));

    let first = resolve(&s.catalog, &Config::default(), &input, &CancellationToken::new()).unwrap();
    let second = resolve(&s.catalog, &Config::default(), &input, &CancellationToken::new()).unwrap();

    assert_eq!(first.groups, second.groups);
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(first.diagnostics.len(), 2);
}

#[test]
fn cancelled_pass_returns_error() {
    let s = sample();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = resolve(
        &s.catalog,
        &Config::default(),
        &PassInput::new().request(MappingRequest::new(s.a, s.x)),
        &cancel,
    )
    .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.to_string(), "resolution pass cancelled");
}

#[test]
fn internal_fault_is_confined_to_its_group() {
    let s = sample();
    let catalog = FaultyCatalog {
        inner: s.catalog,
        broken: s.b,
    };

    let input = PassInput::new()
        .request(MappingRequest::new(s.b, s.x).at(RequestSite::new(4, 2)))
        .request(MappingRequest::new(s.a, s.x));
    let output = resolve(&catalog, &Config::default(), &input, &CancellationToken::new()).unwrap();

    assert_eq!(output.diagnostics.len(), 1);
    let fault = &output.diagnostics[0];
    assert_eq!(fault.code, DiagnosticCode::UnexpectedException);
    assert_eq!(fault.args, ["member table for B is corrupt"]);
    assert_eq!(fault.sites, [RequestSite::new(4, 2)]);

    assert!(output.groups[0].plans.is_empty());
    assert_eq!(output.groups[1].plans.len(), 1);
}

#[test]
fn fault_on_target_only_drops_that_plan() {
    let s = sample();
    let catalog = FaultyCatalog {
        inner: s.catalog,
        broken: s.y,
    };

    let input = PassInput::new()
        .request(MappingRequest::new(s.a, s.y))
        .request(MappingRequest::new(s.a, s.x));
    let output = resolve(&catalog, &Config::default(), &input, &CancellationToken::new()).unwrap();

    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, DiagnosticCode::UnexpectedException);

    let targets: Vec<_> = output.groups[0].plans.iter().map(|p| p.target).collect();
    assert_eq!(targets, [s.x]);
}

#[test]
fn request_for_unknown_type_is_reported() {
    let s = sample();
    let input = PassInput::new()
        .request(MappingRequest::new(s.a, TypeId(10_000)).at(RequestSite::new(9, 9)))
        .request(MappingRequest::new(s.a, s.x));

    let output = resolve(&s.catalog, &Config::default(), &input, &CancellationToken::new()).unwrap();

    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, DiagnosticCode::UnexpectedException);
    assert_eq!(output.diagnostics[0].args, ["unknown type id #10000"]);
    assert_eq!(output.groups.len(), 1);
}

#[test]
fn profile_order_is_reported() {
    let s = sample();
    let input = PassInput::new()
        .profile(ProfileDeclaration::predefined(ProfileId(0), "::objmap::builtin"))
        .profile(ProfileDeclaration::new(ProfileId(1), "crate::Base"))
        .profile(ProfileDeclaration::new(ProfileId(2), "crate::App").include(ProfileId(1)));

    let output = resolve(&s.catalog, &Config::default(), &input, &CancellationToken::new()).unwrap();

    assert_eq!(output.profile_order, [ProfileId(2), ProfileId(1), ProfileId(0)]);
    assert!(output.groups.is_empty());
}

/// Renders each group as a line of `source -> target` pairs, failing on one
/// chosen source.
struct LineEmitter {
    fail_on: Option<TypeId>,
}

impl CodeEmitter for LineEmitter {
    type Output = String;

    fn emit_group(
        &mut self,
        group: &PlanGroup,
        catalog: &dyn TypeCatalog,
        _config: &Config,
    ) -> Result<String> {
        if Some(group.source) == self.fail_on {
            objmap_core::bail!("cannot render {}", catalog.type_name(group.source));
        }

        Ok(group
            .plans
            .iter()
            .map(|p| format!("{} -> {}", catalog.type_name(p.source), catalog.type_name(p.target)))
            .collect::<Vec<_>>()
            .join("; "))
    }
}

#[test]
fn emitter_runs_per_group_and_failures_are_reported() {
    let s = sample();
    let input = PassInput::new()
        .request(MappingRequest::new(s.a, s.x).at(RequestSite::new(1, 1)))
        .request(MappingRequest::new(s.b, s.x))
        .request(MappingRequest::new(s.b, s.y));

    let mut output = resolve(&s.catalog, &Config::default(), &input, &CancellationToken::new()).unwrap();
    let info_before = output.diagnostics.len();

    let rendered = output.emit(&mut LineEmitter { fail_on: None }, &s.catalog, &Config::default());
    assert_eq!(rendered, ["A -> X", "B -> X; B -> Y"]);

    let rendered = output.emit(
        &mut LineEmitter { fail_on: Some(s.a) },
        &s.catalog,
        &Config::default(),
    );
    assert_eq!(rendered, ["B -> X; B -> Y"]);

    let fault = &output.diagnostics[info_before];
    assert_eq!(fault.code, DiagnosticCode::UnexpectedException);
    assert_eq!(fault.args, ["cannot render A"]);
    assert_eq!(fault.sites, [RequestSite::new(1, 1)]);
    assert!(output.has_errors());
}

#[test]
fn caches_fill_consistently_from_many_threads() {
    let Sample {
        mut catalog,
        a,
        b,
        x,
        y,
    } = sample();
    let i32 = catalog.primitive(Primitive::I32);
    let i64 = catalog.primitive(Primitive::I64);

    let cx = ResolutionContext::new(&catalog, Config::default());
    let types = [a, b, x, y];
    let pairs = [
        MappingPair::new(a, b),
        MappingPair::new(x, y),
        MappingPair::new(i32, i64),
        MappingPair::new(i64, i32),
    ];

    let results: Vec<(Vec<Arc<TypeMapMetaData>>, Vec<Conversion>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let metadata: Vec<_> = types.iter().map(|ty| cx.metadata(*ty).unwrap()).collect();
                    let conversions: Vec<_> = pairs
                        .iter()
                        .map(|pair| cx.conversion(*pair, true).unwrap())
                        .collect();
                    (metadata, conversions)
                })
            })
            .collect();

        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let stored: Vec<Conversion> = pairs
        .iter()
        .map(|pair| cx.conversion(*pair, true).unwrap())
        .collect();
    assert_eq!(stored[2], Conversion::Implicit);
    assert_eq!(
        stored[3],
        Conversion::Invoke(MethodInvokeDescriptor::cast(i32))
    );
    assert_eq!(cx.cached_conversions(), pairs.len());

    for (metadata, conversions) in &results {
        for (meta, ty) in metadata.iter().zip(types) {
            assert!(Arc::ptr_eq(meta, &cx.metadata(ty).unwrap()));
        }
        assert_eq!(conversions, &stored);
    }
}
