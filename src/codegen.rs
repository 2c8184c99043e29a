//! Expand a copy call into explicit setter calls.
//!
//! ```text
//! OrderDto orderDto = new OrderDto();
//! orderDto.setId(order.getId());
//! orderDto.setTotal(order.getTotal());
//! ```

use crate::reconcile::Reconciliation;

/// Setter block equivalent to the copy, one line per common property.
///
/// `source_expr` is the source argument as written at the call site and
/// `indent` prefixes every line.
pub fn generate_setters(reconciliation: &Reconciliation, source_expr: &str, indent: &str) -> String {
    let target_class = reconciliation.target_type.simple_name();
    let variable = variable_name(target_class);

    let mut lines = vec![format!(
        "{indent}{target_class} {variable} = new {target_class}();"
    )];
    for name in reconciliation.common_names() {
        let property = upper_first(&name);
        lines.push(format!(
            "{indent}{variable}.set{property}({source_expr}.get{property}());"
        ));
    }
    lines.join("\n")
}

/// Local variable for an instance of `class`.
fn variable_name(class: &str) -> String {
    match class {
        "" => "target".to_string(),
        name => lower_first(name),
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
