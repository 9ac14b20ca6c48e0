//! Identifier filter engine.
//!
//! A [`FilterList`] is an ordered set of accept/reject range rules. A frame is
//! admitted when the **last** rule matching its format and identifier is an
//! accept rule; without any matching rule the frame is rejected, so an empty
//! list admits nothing. Evaluation walks the list once and never allocates.
use crate::core::{FrameFormat, EXTENDED_ID_MASK, STANDARD_ID_MASK};
use crate::error::FilterError;
use crate::protocol::frame::CanFrame;

//==================================================================================FILTER_RULE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterPolicy {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Frame formats a rule applies to.
pub enum FormatMatch {
    #[default]
    Any,
    Only(FrameFormat),
}

impl FormatMatch {
    #[inline]
    pub const fn matches(self, format: FrameFormat) -> bool {
        match self {
            FormatMatch::Any => true,
            FormatMatch::Only(expected) => expected as u8 == format as u8,
        }
    }

    /// Widest identifier this selection can see.
    const fn id_mask(self) -> u32 {
        match self {
            FormatMatch::Any => EXTENDED_ID_MASK,
            FormatMatch::Only(format) if format.is_extended() => EXTENDED_ID_MASK,
            FormatMatch::Only(_) => STANDARD_ID_MASK,
        }
    }
}

impl From<FrameFormat> for FormatMatch {
    fn from(format: FrameFormat) -> Self {
        FormatMatch::Only(format)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// One accept or reject test over an inclusive identifier range.
pub struct FilterRule {
    policy: FilterPolicy,
    format: FormatMatch,
    low: u32,
    high: u32,
}

impl FilterRule {
    /// Fails when `low > high` or when `high` lies outside the identifier
    /// space of `format`.
    pub fn new(
        policy: FilterPolicy,
        format: impl Into<FormatMatch>,
        low: u32,
        high: u32,
    ) -> Result<Self, FilterError> {
        let format = format.into();
        if low > high {
            return Err(FilterError::InvalidRange { low, high });
        }
        let mask = format.id_mask();
        if high > mask {
            return Err(FilterError::IdentifierOutOfRange { high, mask });
        }
        Ok(Self {
            policy,
            format,
            low,
            high,
        })
    }

    pub fn accept(format: impl Into<FormatMatch>, low: u32, high: u32) -> Result<Self, FilterError> {
        Self::new(FilterPolicy::Accept, format, low, high)
    }

    pub fn reject(format: impl Into<FormatMatch>, low: u32, high: u32) -> Result<Self, FilterError> {
        Self::new(FilterPolicy::Reject, format, low, high)
    }

    #[inline]
    pub const fn policy(&self) -> FilterPolicy {
        self.policy
    }

    #[inline]
    pub const fn format(&self) -> FormatMatch {
        self.format
    }

    /// Inclusive bounds.
    #[inline]
    pub const fn range(&self) -> (u32, u32) {
        (self.low, self.high)
    }

    /// Format matches and identifier within `[low, high]`.
    #[inline]
    pub fn matches(&self, frame: &CanFrame) -> bool {
        self.format.matches(frame.format())
            && frame.identifier() >= self.low
            && frame.identifier() <= self.high
    }
}

//==================================================================================FILTER_LIST
#[derive(Debug, Clone, Default)]
/// Ordered rule list with room for `N` rules.
pub struct FilterList<const N: usize> {
    rules: heapless::Vec<FilterRule, N>,
}

impl<const N: usize> FilterList<N> {
    pub const fn new() -> Self {
        Self {
            rules: heapless::Vec::new(),
        }
    }

    /// Append a rule and return its index.
    pub fn append_filter(&mut self, rule: FilterRule) -> Result<usize, FilterError> {
        self.rules.push(rule).map_err(|_| FilterError::ListFull)?;
        Ok(self.rules.len() - 1)
    }

    /// Remove the rule at `index`; later rules shift down by one.
    pub fn remove_filter(&mut self, index: usize) -> Result<FilterRule, FilterError> {
        if index >= self.rules.len() {
            return Err(FilterError::IndexOutOfRange {
                index,
                len: self.rules.len(),
            });
        }
        Ok(self.rules.remove(index))
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FilterRule> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterRule> {
        self.rules.iter()
    }

    /// `true` when the frame is admitted.
    pub fn filter(&self, frame: &CanFrame) -> bool {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(frame))
            .is_some_and(|rule| rule.policy == FilterPolicy::Accept)
    }
}

//==================================================================================TEST_FILTER
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
