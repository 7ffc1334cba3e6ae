//! Success/failure branch manipulation.
//!
//! Branch lists are `Option<Vec<Reusable<BranchAction>>>`. `None` means "no actions";
//! every filter here collapses an emptied list back to `None` so documents never
//! serialize a vacuous `onSuccess: []`. Registry references are opaque and always
//! pass through unchanged.

use arazzo_types::{ActionKind, BranchAction, Reusable, is_identifier_char};

/// Ordered list of branch actions as stored on a step or workflow.
pub type ActionList = Vec<Reusable<BranchAction>>;

/// Prefix of the name given to generated `goto` actions.
pub const GOTO_NAME_PREFIX: &str = "goto-";

/// Prefix of the name given to generated `retry` actions.
pub const RETRY_NAME_PREFIX: &str = "retry-";

/// Returns the step an action jumps to when the jump stays inside `origin_workflow_id`.
///
/// Actions naming a different workflow are cross-workflow jumps and are never
/// treated as local, even when they also carry a `stepId`.
pub fn local_target<'a>(action: &'a BranchAction, origin_workflow_id: &str) -> Option<&'a str> {
    let step_id = action.step_id()?;
    match action.workflow_id() {
        None => Some(step_id),
        Some(workflow_id) if workflow_id == origin_workflow_id => Some(step_id),
        Some(_) => None,
    }
}

/// Returns true when the action is a local jump to `step_id`.
pub fn targets_step(action: &BranchAction, origin_workflow_id: &str, step_id: &str) -> bool {
    local_target(action, origin_workflow_id) == Some(step_id)
}

/// Builds the `goto` action the canvas creates for a new edge.
pub fn goto_action(target_step_id: &str) -> Reusable<BranchAction> {
    Reusable::Inline(BranchAction::goto_step(format!("{GOTO_NAME_PREFIX}{target_step_id}"), target_step_id))
}

/// Retargets every local action pointing at `old_step_id`, keeping the name in sync.
///
/// Returns the number of rewritten actions.
pub fn retarget(actions: &mut Option<ActionList>, origin_workflow_id: &str, old_step_id: &str, new_step_id: &str) -> usize {
    rewrite_matching(actions, old_step_id, new_step_id, |action| {
        targets_step(action, origin_workflow_id, old_step_id)
    })
}

/// Removes every local action pointing at `step_id`. Returns the number removed.
pub fn remove_targeting(actions: &mut Option<ActionList>, origin_workflow_id: &str, step_id: &str) -> usize {
    remove_matching(actions, |action| targets_step(action, origin_workflow_id, step_id))
}

/// Removes only the local `goto` actions pointing at `step_id`. Returns the number removed.
pub fn remove_goto_targeting(actions: &mut Option<ActionList>, origin_workflow_id: &str, step_id: &str) -> usize {
    remove_matching(actions, |action| {
        action.kind() == ActionKind::Goto && targets_step(action, origin_workflow_id, step_id)
    })
}

/// Reroutes the local `goto` actions aimed at `old_target` to `new_target`.
///
/// Used when a step is inserted on an existing edge. Returns the number of rerouted actions.
pub fn splice_insert(actions: &mut Option<ActionList>, origin_workflow_id: &str, old_target: &str, new_target: &str) -> usize {
    rewrite_matching(actions, old_target, new_target, |action| {
        action.kind() == ActionKind::Goto && targets_step(action, origin_workflow_id, old_target)
    })
}

/// Collapses an empty list to the absent state.
pub fn collapse(actions: &mut Option<ActionList>) {
    if actions.as_ref().is_some_and(Vec::is_empty) {
        *actions = None;
    }
}

/// Iterates the inline actions of a branch, skipping registry references.
pub fn inline_actions(actions: &Option<ActionList>) -> impl Iterator<Item = &BranchAction> {
    actions.iter().flatten().filter_map(Reusable::as_inline)
}

fn rewrite_matching<F>(actions: &mut Option<ActionList>, old_step_id: &str, new_step_id: &str, matches: F) -> usize
where
    F: Fn(&BranchAction) -> bool,
{
    let Some(list) = actions.as_mut() else {
        return 0;
    };

    let mut rewritten = 0;
    for action in list.iter_mut().filter_map(Reusable::as_inline_mut) {
        if !matches(action) {
            continue;
        }
        action.set_step_id(new_step_id);
        let name = action.name_mut();
        *name = rename_in_action_name(name, old_step_id, new_step_id);
        rewritten += 1;
    }
    rewritten
}

/// Rewrites the target id embedded in an action name.
///
/// Generated names (`goto-<id>`, `retry-<id>`) only have their suffix replaced. In any
/// other name the id is replaced where it stands alone, delimited by characters that
/// cannot occur in an identifier, so `after-a` keeps its text when `a` is renamed.
pub fn rename_in_action_name(name: &str, old_step_id: &str, new_step_id: &str) -> String {
    for prefix in [GOTO_NAME_PREFIX, RETRY_NAME_PREFIX] {
        if name.strip_prefix(prefix) == Some(old_step_id) {
            return format!("{prefix}{new_step_id}");
        }
    }
    if old_step_id.is_empty() {
        return name.to_string();
    }

    let mut renamed = String::with_capacity(name.len());
    let mut remainder = name;
    let mut previous: Option<char> = None;
    while let Some(start) = remainder.find(old_step_id) {
        let end = start + old_step_id.len();
        let before = remainder[..start].chars().next_back().or(previous);
        let after = remainder[end..].chars().next();
        let bounded = !before.is_some_and(is_identifier_char) && !after.is_some_and(is_identifier_char);

        renamed.push_str(&remainder[..start]);
        renamed.push_str(if bounded { new_step_id } else { old_step_id });
        previous = old_step_id.chars().next_back();
        remainder = &remainder[end..];
    }
    renamed.push_str(remainder);
    renamed
}

fn remove_matching<F>(actions: &mut Option<ActionList>, matches: F) -> usize
where
    F: Fn(&BranchAction) -> bool,
{
    let Some(list) = actions.as_mut() else {
        return 0;
    };

    let before = list.len();
    list.retain(|entry| entry.as_inline().is_none_or(|action| !matches(action)));
    let removed = before - list.len();
    collapse(actions);
    removed
}
