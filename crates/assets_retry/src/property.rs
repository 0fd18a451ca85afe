use core::fmt::{Display, Formatter, Result as FmtResult};

/// The url-valued properties that get fallback chains.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum WatchedProperty {
    BackgroundImage,
    BorderImage,
    ListStyleImage,
}

impl WatchedProperty {
    pub const ALL: [Self; 3] = [
        Self::BackgroundImage,
        Self::BorderImage,
        Self::ListStyleImage,
    ];

    /// Hyphenated name as written in CSS text.
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::BackgroundImage => "background-image",
            Self::BorderImage => "border-image",
            Self::ListStyleImage => "list-style-image",
        }
    }

    /// Camel-cased name as exposed on `CSSStyleDeclaration`.
    pub const fn dom_name(self) -> &'static str {
        match self {
            Self::BackgroundImage => "backgroundImage",
            Self::BorderImage => "borderImage",
            Self::ListStyleImage => "listStyleImage",
        }
    }
}

impl Display for WatchedProperty {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        formatter.write_str(self.dom_name())
    }
}
