#![forbid(unsafe_code)]

//! Aggregate tri-state and its visual projection.

use std::fmt;

/// Summary of a set of boolean children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum TriState {
    /// Nothing selected. Also the state of an empty set.
    #[default]
    None,
    /// Mixed selection.
    Some,
    /// Every child selected (and there is at least one child).
    All,
}

impl TriState {
    /// Derive the state from a count of present values out of `total`.
    ///
    /// `total == 0` is always [`TriState::None`].
    #[must_use]
    pub const fn from_counts(present: usize, total: usize) -> Self {
        if total == 0 || present == 0 {
            Self::None
        } else if present >= total {
            Self::All
        } else {
            Self::Some
        }
    }

    /// The state the aggregate control moves to when activated.
    ///
    /// A mixed state always clears.
    #[must_use]
    pub const fn activated(self) -> Self {
        match self {
            Self::None => Self::All,
            Self::Some | Self::All => Self::None,
        }
    }

    /// Checkbox glyph for text renderers.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::None => "[ ]",
            Self::Some => "[-]",
            Self::All => "[x]",
        }
    }

    /// Shorthand for [`Indicator::from`].
    #[must_use]
    pub const fn indicator(self) -> Indicator {
        match self {
            Self::None => Indicator {
                checked: false,
                indeterminate: false,
            },
            Self::Some => Indicator {
                checked: true,
                indeterminate: true,
            },
            Self::All => Indicator {
                checked: true,
                indeterminate: false,
            },
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// The two boolean attributes a checkbox element needs to show a tri-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Indicator {
    /// `true` for `Some` and `All`.
    pub checked: bool,
    /// `true` only for `Some`.
    pub indeterminate: bool,
}

impl From<TriState> for Indicator {
    fn from(state: TriState) -> Self {
        state.indicator()
    }
}
