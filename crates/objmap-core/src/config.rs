use serde::Deserialize;

/// Options for one resolution pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Visibility of the generated mapping entry points
    pub accessibility: Accessibility,
}

impl Config {
    /// Create a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the visibility of generated entry points
    pub fn accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }
}

/// Visibility of generated mapping entry points.
///
/// Parsed leniently: `"public"` in any case selects [`Accessibility::Public`],
/// every other value falls back to [`Accessibility::Internal`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Accessibility {
    /// Visible within the crate that owns the generated code
    #[default]
    Internal,
    Public,
}

impl Accessibility {
    pub fn parse(value: &str) -> Accessibility {
        if value.trim().eq_ignore_ascii_case("public") {
            Accessibility::Public
        } else {
            Accessibility::Internal
        }
    }
}

impl From<String> for Accessibility {
    fn from(value: String) -> Self {
        Accessibility::parse(&value)
    }
}

impl core::str::FromStr for Accessibility {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Accessibility::parse(s))
    }
}
