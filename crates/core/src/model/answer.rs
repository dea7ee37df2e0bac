use serde::{Deserialize, Serialize};

/// Integer code used by the results boundary for "no answer recorded".
pub const UNANSWERED_CODE: i32 = -1;

/// What was recorded for a question when the student left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "option", rename_all = "snake_case")]
pub enum CommittedAnswer {
    /// An explicit option was selected when advancing.
    Selected(usize),
    /// Advanced with no selection.
    Unanswered,
    /// Left through `skip`, whatever was selected.
    Skipped,
}

impl CommittedAnswer {
    #[must_use]
    pub fn from_selection(selection: Option<usize>) -> Self {
        selection.map_or(Self::Unanswered, Self::Selected)
    }

    #[must_use]
    pub fn option_index(self) -> Option<usize> {
        match self {
            CommittedAnswer::Selected(index) => Some(index),
            CommittedAnswer::Unanswered | CommittedAnswer::Skipped => None,
        }
    }

    /// External encoding: the option index, or `-1` when nothing was chosen.
    #[must_use]
    pub fn code(self) -> i32 {
        self.option_index()
            .and_then(|index| i32::try_from(index).ok())
            .unwrap_or(UNANSWERED_CODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_collapse_unanswered_and_skipped() {
        assert_eq!(CommittedAnswer::Selected(2).code(), 2);
        assert_eq!(CommittedAnswer::Unanswered.code(), -1);
        assert_eq!(CommittedAnswer::Skipped.code(), -1);
        assert_eq!(CommittedAnswer::from_selection(None), CommittedAnswer::Unanswered);
        assert_eq!(
            CommittedAnswer::from_selection(Some(0)),
            CommittedAnswer::Selected(0)
        );
    }
}
