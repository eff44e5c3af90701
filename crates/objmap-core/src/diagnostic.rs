use std::sync::{Arc, Mutex};

/// Stable identifiers for every condition the engine reports.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticCode {
    UnexpectedException,
    AmbiguousMapType,
    NoAnyPublicConstructor,
    ConstructorMatchFailed,
    ErrorMappingProfileInclude,
    ProfileNotExtensible,
    CollectionMappingMethodDefineError,
    CollectionMapIncorrectUsage,
    UndefinedCollectionMapping,
    PropertyOrFieldTypeNotMatch,
    InitOnlyPropertyCanNotMap,
    ReadOnlyFieldCanNotMap,
    DuplicateDefinitionCollectionMappingMethod,
    NotFoundMatchPropertyOrField,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl DiagnosticCode {
    pub fn id(self) -> &'static str {
        use DiagnosticCode::*;

        match self {
            UnexpectedException => "OM000",
            AmbiguousMapType => "OM001",
            NoAnyPublicConstructor => "OM002",
            ConstructorMatchFailed => "OM003",
            ErrorMappingProfileInclude => "OM004",
            ProfileNotExtensible => "OM005",
            CollectionMappingMethodDefineError => "OM006",
            CollectionMapIncorrectUsage => "OM007",
            UndefinedCollectionMapping => "OM008",
            PropertyOrFieldTypeNotMatch => "OM101",
            InitOnlyPropertyCanNotMap => "OM102",
            ReadOnlyFieldCanNotMap => "OM103",
            DuplicateDefinitionCollectionMappingMethod => "OM104",
            NotFoundMatchPropertyOrField => "OM201",
        }
    }

    pub fn severity(self) -> Severity {
        use DiagnosticCode::*;

        match self {
            PropertyOrFieldTypeNotMatch
            | InitOnlyPropertyCanNotMap
            | ReadOnlyFieldCanNotMap
            | DuplicateDefinitionCollectionMappingMethod => Severity::Warning,
            NotFoundMatchPropertyOrField => Severity::Info,
            _ => Severity::Error,
        }
    }

    /// Message template; `{N}` is replaced by the N-th argument.
    pub fn template(self) -> &'static str {
        use DiagnosticCode::*;

        match self {
            UnexpectedException => "unexpected failure while generating mappings: {0}",
            AmbiguousMapType => {
                "type `{0}` is a built-in type and cannot be mapped member by member"
            }
            NoAnyPublicConstructor => {
                "type `{0}` has no public constructor; declare a prepare hook that creates it"
            }
            ConstructorMatchFailed => {
                "no public constructor of `{0}` can be satisfied from the members of `{1}`"
            }
            ErrorMappingProfileInclude => {
                "profile `{0}` includes `{1}`, which is not a known mapping profile"
            }
            ProfileNotExtensible => {
                "mapping profile `{0}` must be a non-generic struct so generated code can extend it"
            }
            CollectionMappingMethodDefineError => {
                "collection mapping method `{0}` must have one type parameter `T`, take a sequence of `T` and return a one-argument collection of `T`"
            }
            CollectionMapIncorrectUsage => {
                "collection `{0}` cannot be mapped onto an existing `{1}` instance"
            }
            UndefinedCollectionMapping => {
                "no collection mapping from `{0}` to `{1}`; declare a collection mapping method for the target collection"
            }
            PropertyOrFieldTypeNotMatch => {
                "`{0}` has candidate source members {1} but none of them converts to {2}"
            }
            InitOnlyPropertyCanNotMap => {
                "init-only members of `{0}` cannot be set on an existing instance: {1}"
            }
            ReadOnlyFieldCanNotMap => "read-only fields of `{0}` cannot be mapped: {1}",
            DuplicateDefinitionCollectionMappingMethod => {
                "collection mapping for `{0}` is defined more than once; the definition in profile `{1}` wins"
            }
            NotFoundMatchPropertyOrField => "no source member found for `{0}`: {1}",
        }
    }
}

impl core::fmt::Display for Severity {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// A location in the host program where a mapping was requested or declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestSite {
    pub file: Option<Arc<str>>,
    pub line: usize,
    pub column: usize,
}

impl RequestSite {
    pub fn new(line: usize, column: usize) -> RequestSite {
        RequestSite {
            file: None,
            line,
            column,
        }
    }

    pub fn in_file(mut self, file: Arc<str>) -> RequestSite {
        self.file = Some(file);
        self
    }
}

impl core::fmt::Display for RequestSite {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,

    /// Positional arguments for the code's message template
    pub args: Vec<String>,

    /// Every request site the diagnostic applies to
    pub sites: Vec<RequestSite>,
}

impl Diagnostic {
    pub fn new<I, S>(code: DiagnosticCode, args: I) -> Diagnostic
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Diagnostic {
            code,
            args: args.into_iter().map(Into::into).collect(),
            sites: vec![],
        }
    }

    pub fn with_sites(mut self, sites: &[RequestSite]) -> Diagnostic {
        for site in sites {
            if !self.sites.contains(site) {
                self.sites.push(site.clone());
            }
        }
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub fn message(&self) -> String {
        render_template(self.code.template(), &self.args)
    }
}

impl core::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity(), self.code.id(), self.message())
    }
}

fn render_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let index = after
            .find('}')
            .and_then(|end| after[..end].parse::<usize>().ok().map(|i| (i, end)));

        match index {
            Some((i, end)) => {
                out.push_str(args.get(i).map(String::as_str).unwrap_or(""));
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Thread-safe collector for the diagnostics of one pass.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        tracing::debug!(code = diagnostic.code.id(), "{}", diagnostic.message());
        self.lock().push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_errors(&self) -> bool {
        self.lock().iter().any(Diagnostic::is_error)
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        match self.items.into_inner() {
            Ok(items) => items,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
