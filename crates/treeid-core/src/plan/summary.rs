//! Human-readable summary renderer for reconciliation plans.

use crate::plan::model::{Diagnostic, PlanAction, ReconciliationPlan};

/// Render a Markdown summary of a [`ReconciliationPlan`].
///
/// Intended for debugging and review output. It does not affect the
/// structured plan.
pub fn render_plan_summary(plan: &ReconciliationPlan) -> String {
    let mut out = String::new();
    let stats = plan.stats();

    out.push_str("## Reconciliation Plan\n\n");
    out.push_str(&format!("**Pass**: `{}`\n\n", plan.pass_id));
    out.push_str(&format!(
        "| Created | Updated | Moved | Destroyed | Activated | Deactivated |\n\
         |---|---|---|---|---|---|\n\
         | {} | {} | {} | {} | {} | {} |\n\n",
        stats.created,
        stats.updated,
        stats.moved,
        stats.destroyed,
        stats.activated,
        stats.deactivated,
    ));

    if plan.actions.is_empty() {
        out.push_str("_No actions._\n");
        return out;
    }

    out.push_str("### Actions\n\n");
    for action in &plan.actions {
        out.push_str(&format!("- {}\n", describe(action)));
    }

    if !plan.diagnostics.is_empty() {
        out.push_str("\n### Diagnostics\n\n");
        for diagnostic in &plan.diagnostics {
            match diagnostic {
                Diagnostic::AmbiguousKey {
                    parent,
                    slot,
                    key,
                    first_index,
                    duplicate_index,
                } => {
                    out.push_str(&format!(
                        "- duplicate key `{}` in {}/{}: index {} matched by position (first at {})\n",
                        key, parent, slot, duplicate_index, first_index
                    ));
                }
                Diagnostic::Evicted {
                    owner,
                    slot,
                    instance,
                } => {
                    out.push_str(&format!(
                        "- keep-alive {}/{} evicted {}\n",
                        owner, slot, instance
                    ));
                }
            }
        }
    }

    out
}

fn describe(action: &PlanAction) -> String {
    match action {
        PlanAction::Create {
            instance,
            kind,
            token,
            index,
            ..
        } => format!("**create** {} {} at {} ({})", kind, instance, index, token),
        PlanAction::Update {
            instance,
            kind,
            index,
            previous_index,
            props_changed,
            ..
        } => {
            let mut line = format!("**update** {} {}", kind, instance);
            match previous_index {
                Some(previous) if previous != index => {
                    line.push_str(&format!(" moved {} → {}", previous, index))
                }
                None => line.push_str(&format!(" restored at {}", index)),
                _ => {}
            }
            if *props_changed {
                line.push_str(" (props changed)");
            }
            line
        }
        PlanAction::Destroy { instance, kind } => format!("**destroy** {} {}", kind, instance),
        PlanAction::Activate { instance, kind } => format!("**activate** {} {}", kind, instance),
        PlanAction::Deactivate { instance, kind } => {
            format!("**deactivate** {} {}", kind, instance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IdentityToken, InstanceId, Key, NodeKind, SlotName};
    use treeid_core_types::PassId;

    #[test]
    fn test_empty_plan_summary() {
        let plan = ReconciliationPlan::new(PassId::from_string("p1".into()));
        let summary = render_plan_summary(&plan);
        assert!(summary.contains("`p1`"));
        assert!(summary.contains("_No actions._"));
    }

    #[test]
    fn test_summary_lists_actions_and_diagnostics() {
        let mut plan = ReconciliationPlan::new(PassId::new());
        plan.actions.push(PlanAction::Update {
            instance: InstanceId::new(2),
            kind: NodeKind::Intrinsic("li".into()),
            parent: Some(InstanceId::new(1)),
            slot: SlotName::default(),
            token: IdentityToken::Key(Key::from("b")),
            index: 0,
            previous_index: Some(1),
            props_changed: true,
        });
        plan.diagnostics.push(Diagnostic::AmbiguousKey {
            parent: InstanceId::new(1),
            slot: SlotName::default(),
            key: Key::from("b"),
            first_index: 0,
            duplicate_index: 2,
        });

        let summary = render_plan_summary(&plan);
        assert!(summary.contains("**update** li i2 moved 1 → 0 (props changed)"));
        assert!(summary.contains("duplicate key `b` in i1/default"));
    }
}
