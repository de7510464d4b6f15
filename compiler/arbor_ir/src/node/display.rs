//! Human-readable rendering of nodes for diagnostics.
//!
//! Deterministic and single-line: operators are parenthesised, statements
//! use braces.

use std::fmt;

use super::{
    CatchClause, ElementInit, MemberBinding, Node, NodeType, SwitchCase, UnaryNode,
};
use crate::value::Value;

fn comma_separated<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_constant(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Str(s) => write!(f, "{:?}", &**s),
        Value::Char(c) => write!(f, "{c:?}"),
        other => write!(f, "{other}"),
    }
}

fn write_unary(f: &mut fmt::Formatter<'_>, node: &UnaryNode) -> fmt::Result {
    let ty = node.value_type();
    let Some(operand) = node.operand() else {
        return f.write_str("rethrow");
    };
    match node.node_type() {
        NodeType::Negate | NodeType::UnaryPlus | NodeType::Not | NodeType::OnesComplement => {
            write!(f, "{}{operand}", node.node_type().as_symbol())
        }
        NodeType::NegateChecked => write!(f, "checked(-{operand})"),
        NodeType::PreIncrementAssign | NodeType::PreDecrementAssign => {
            write!(f, "{}{operand}", node.node_type().as_symbol())
        }
        NodeType::PostIncrementAssign | NodeType::PostDecrementAssign => {
            write!(f, "{operand}{}", node.node_type().as_symbol())
        }
        NodeType::Convert => write!(f, "({ty}){operand}"),
        NodeType::ConvertChecked => write!(f, "checked(({ty}){operand})"),
        NodeType::TypeAs => write!(f, "({operand} as {ty})"),
        NodeType::Unbox => write!(f, "unbox<{ty}>({operand})"),
        NodeType::ArrayLength => write!(f, "{operand}.Length"),
        NodeType::Quote => write!(f, "quote({operand})"),
        NodeType::Throw => write!(f, "throw {operand}"),
        NodeType::IsTrue => write!(f, "is_true({operand})"),
        NodeType::IsFalse => write!(f, "is_false({operand})"),
        NodeType::Increment => write!(f, "increment({operand})"),
        NodeType::Decrement => write!(f, "decrement({operand})"),
        other => write!(f, "{other:?}({operand})"),
    }
}

impl fmt::Display for ElementInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arguments().as_ref() {
            [single] => write!(f, "{single}"),
            args => {
                f.write_str("{ ")?;
                comma_separated(f, args)?;
                f.write_str(" }")
            }
        }
    }
}

impl fmt::Display for MemberBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberBinding::Assignment { member, expression } => {
                write!(f, "{} = {expression}", member.name())
            }
            MemberBinding::Member { member, bindings } => {
                write!(f, "{} = {{ ", member.name())?;
                comma_separated(f, bindings)?;
                f.write_str(" }")
            }
            MemberBinding::List {
                member,
                initializers,
            } => {
                write!(f, "{} = {{ ", member.name())?;
                comma_separated(f, initializers)?;
                f.write_str(" }")
            }
        }
    }
}

impl fmt::Display for SwitchCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("case ")?;
        comma_separated(f, self.test_values())?;
        write!(f, ": {};", self.body())
    }
}

impl fmt::Display for CatchClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "catch ({}", self.test())?;
        if let Some(variable) = self.variable() {
            write!(f, " {}", variable.display_name())?;
        }
        f.write_str(")")?;
        if let Some(filter) = self.filter() {
            write!(f, " when ({filter})")?;
        }
        write!(f, " {{ {} }}", self.body())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Constant(n) => write_constant(f, n.value()),
            Node::Default(n) => write!(f, "default({})", n.value_type()),
            Node::Parameter(p) => f.write_str(&p.display_name()),
            Node::Binary(n) => match n.node_type() {
                NodeType::ArrayIndex => write!(f, "{}[{}]", n.left(), n.right()),
                NodeType::AddChecked
                | NodeType::SubtractChecked
                | NodeType::MultiplyChecked
                | NodeType::AddAssignChecked
                | NodeType::SubtractAssignChecked
                | NodeType::MultiplyAssignChecked => write!(
                    f,
                    "checked({} {} {})",
                    n.left(),
                    n.node_type().as_symbol(),
                    n.right()
                ),
                op => write!(f, "({} {} {})", n.left(), op.as_symbol(), n.right()),
            },
            Node::Unary(n) => write_unary(f, n),
            Node::TypeBinary(n) => {
                let verb = if n.node_type() == NodeType::TypeEqual {
                    "is exactly"
                } else {
                    "is"
                };
                write!(f, "({} {verb} {})", n.expression(), n.type_operand())
            }
            Node::Conditional(n) => {
                if n.value_type().is_void() {
                    write!(f, "if ({}) {{ {} }} else {{ {} }}", n.test(), n.if_true(), n.if_false())
                } else {
                    write!(f, "({} ? {} : {})", n.test(), n.if_true(), n.if_false())
                }
            }
            Node::Call(n) => {
                if let Some(object) = n.object() {
                    write!(f, "{object}.")?;
                }
                write!(f, "{}(", n.method().name())?;
                comma_separated(f, n.arguments())?;
                f.write_str(")")
            }
            Node::Invoke(n) => {
                write!(f, "{}(", n.expression())?;
                comma_separated(f, n.arguments())?;
                f.write_str(")")
            }
            Node::New(n) => {
                write!(f, "new {}(", n.value_type())?;
                comma_separated(f, n.arguments())?;
                f.write_str(")")
            }
            Node::NewArray(n) => {
                if n.node_type() == NodeType::NewArrayBounds {
                    write!(f, "new {}[", n.element_type())?;
                    comma_separated(f, n.expressions())?;
                    f.write_str("]")
                } else {
                    write!(f, "new {}[] {{ ", n.element_type())?;
                    comma_separated(f, n.expressions())?;
                    f.write_str(" }")
                }
            }
            Node::Member(n) => match n.expression() {
                Some(object) => write!(f, "{object}.{}", n.member().name()),
                None => f.write_str(n.member().name()),
            },
            Node::Index(n) => {
                write!(f, "{}[", n.object())?;
                comma_separated(f, n.arguments())?;
                f.write_str("]")
            }
            Node::Lambda(n) => {
                f.write_str("(")?;
                let names: Vec<String> = n.parameters().iter().map(|p| p.display_name()).collect();
                comma_separated(f, &names)?;
                write!(f, ") => {}", n.body())
            }
            Node::Block(n) => {
                f.write_str("{ ")?;
                for variable in n.variables().iter() {
                    write!(f, "var {}: {}; ", variable.display_name(), variable.value_type())?;
                }
                for expression in n.expressions().iter() {
                    write!(f, "{expression}; ")?;
                }
                f.write_str("}")
            }
            Node::Loop(n) => {
                f.write_str("loop")?;
                if let Some(label) = n.break_label() {
                    write!(f, " break {label}")?;
                }
                if let Some(label) = n.continue_label() {
                    write!(f, " continue {label}")?;
                }
                write!(f, " {{ {} }}", n.body())
            }
            Node::Label(n) => match n.default_value() {
                Some(value) => write!(f, "{}: {value}", n.target()),
                None => write!(f, "{}:", n.target()),
            },
            Node::Goto(n) => {
                write!(f, "{} {}", n.kind().keyword(), n.target())?;
                if let Some(value) = n.value() {
                    write!(f, " {value}")?;
                }
                Ok(())
            }
            Node::Switch(n) => {
                write!(f, "switch ({}) {{ ", n.switch_value())?;
                for case in n.cases().iter() {
                    write!(f, "{case} ")?;
                }
                if let Some(default_body) = n.default_body() {
                    write!(f, "default: {default_body}; ")?;
                }
                f.write_str("}")
            }
            Node::Try(n) => {
                write!(f, "try {{ {} }}", n.body())?;
                for handler in n.handlers().iter() {
                    write!(f, " {handler}")?;
                }
                if let Some(finally) = n.finally() {
                    write!(f, " finally {{ {finally} }}")?;
                }
                if let Some(fault) = n.fault() {
                    write!(f, " fault {{ {fault} }}")?;
                }
                Ok(())
            }
            Node::ListInit(n) => {
                write!(f, "{} {{ ", Node::New(n.new_expression().clone()))?;
                comma_separated(f, n.initializers())?;
                f.write_str(" }")
            }
            Node::MemberInit(n) => {
                write!(f, "{} {{ ", Node::New(n.new_expression().clone()))?;
                comma_separated(f, n.bindings())?;
                f.write_str(" }")
            }
            Node::Extension(n) => write!(f, "{}(..)", n.name()),
        }
    }
}
