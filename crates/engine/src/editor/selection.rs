//! Focus tracking for the editing surfaces.

/// Document areas that can hold focus without naming a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentRegion {
    Info,
    Inputs,
    Outputs,
    Sources,
}

/// What the inspector and canvas currently highlight.
///
/// A `Step` selection always names a step of the active workflow; mutations that
/// remove or rename the step update it in the same revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Nothing,
    Step(String),
    Region(DocumentRegion),
}

impl Selection {
    pub fn step(step_id: impl Into<String>) -> Self {
        Self::Step(step_id.into())
    }

    /// Selected step identifier, if a step holds focus.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            Self::Step(step_id) => Some(step_id),
            _ => None,
        }
    }

    pub fn is_step(&self, step_id: &str) -> bool {
        self.step_id() == Some(step_id)
    }

    /// Clears the selection when it points at the removed step.
    pub fn on_step_removed(&mut self, step_id: &str) {
        if self.is_step(step_id) {
            self.reset();
        }
    }

    /// Follows a rename of the selected step.
    pub fn on_step_renamed(&mut self, old_id: &str, new_id: &str) {
        if self.is_step(old_id) {
            *self = Self::step(new_id);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::Nothing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_only_clears_matching_step() {
        let mut selection = Selection::step("a");
        selection.on_step_removed("b");
        assert_eq!(selection, Selection::step("a"));
        selection.on_step_removed("a");
        assert_eq!(selection, Selection::Nothing);
    }

    #[test]
    fn rename_redirects_selection() {
        let mut selection = Selection::step("a");
        selection.on_step_renamed("a", "x");
        assert_eq!(selection.step_id(), Some("x"));

        let mut region = Selection::Region(DocumentRegion::Inputs);
        region.on_step_renamed("a", "x");
        assert_eq!(region, Selection::Region(DocumentRegion::Inputs));
    }
}
