//! Node discriminants.

/// The kind of a node.
///
/// Binary and unary nodes share one struct each; this discriminant says
/// which operator they carry. Every other node kind maps to exactly one
/// `Node` variant.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeType {
    // Arithmetic
    Add,
    AddChecked,
    Subtract,
    SubtractChecked,
    Multiply,
    MultiplyChecked,
    Divide,
    Modulo,
    Power,

    // Bitwise / logical
    And,
    Or,
    ExclusiveOr,
    LeftShift,
    RightShift,
    AndAlso,
    OrElse,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // Other binary
    Coalesce,
    ArrayIndex,

    // Assignment
    Assign,
    AddAssign,
    AddAssignChecked,
    SubtractAssign,
    SubtractAssignChecked,
    MultiplyAssign,
    MultiplyAssignChecked,
    DivideAssign,
    ModuloAssign,
    PowerAssign,
    AndAssign,
    OrAssign,
    ExclusiveOrAssign,
    LeftShiftAssign,
    RightShiftAssign,

    // Unary
    Negate,
    NegateChecked,
    UnaryPlus,
    Not,
    OnesComplement,
    IsTrue,
    IsFalse,
    Increment,
    Decrement,
    ArrayLength,
    Convert,
    ConvertChecked,
    TypeAs,
    Unbox,
    Quote,
    Throw,
    PreIncrementAssign,
    PreDecrementAssign,
    PostIncrementAssign,
    PostDecrementAssign,

    // Type tests
    TypeIs,
    TypeEqual,

    // Leaves
    Constant,
    Default,
    Parameter,

    // Access and calls
    MemberAccess,
    Index,
    Call,
    Invoke,
    New,
    NewArrayInit,
    NewArrayBounds,
    ListInit,
    MemberInit,
    Lambda,

    // Statements
    Conditional,
    Block,
    Loop,
    Label,
    Goto,
    Switch,
    Try,

    /// Host-defined node that reduces to built-in nodes.
    Extension,
}

impl NodeType {
    /// Whether a `BinaryNode` may carry this kind.
    pub const fn is_binary(self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::AddChecked
                | Self::Subtract
                | Self::SubtractChecked
                | Self::Multiply
                | Self::MultiplyChecked
                | Self::Divide
                | Self::Modulo
                | Self::Power
                | Self::And
                | Self::Or
                | Self::ExclusiveOr
                | Self::LeftShift
                | Self::RightShift
                | Self::AndAlso
                | Self::OrElse
                | Self::Equal
                | Self::NotEqual
                | Self::LessThan
                | Self::LessThanOrEqual
                | Self::GreaterThan
                | Self::GreaterThanOrEqual
                | Self::Coalesce
                | Self::ArrayIndex
        ) || self.is_assignment()
    }

    /// Whether a `UnaryNode` may carry this kind.
    pub const fn is_unary(self) -> bool {
        matches!(
            self,
            Self::Negate
                | Self::NegateChecked
                | Self::UnaryPlus
                | Self::Not
                | Self::OnesComplement
                | Self::IsTrue
                | Self::IsFalse
                | Self::Increment
                | Self::Decrement
                | Self::ArrayLength
                | Self::Convert
                | Self::ConvertChecked
                | Self::TypeAs
                | Self::Unbox
                | Self::Quote
                | Self::Throw
        ) || self.is_increment_assignment()
    }

    /// `Assign` and every compound assignment.
    pub const fn is_assignment(self) -> bool {
        matches!(self, Self::Assign) || self.compound_operator().is_some()
    }

    /// The four pre/post increment/decrement assignments.
    pub const fn is_increment_assignment(self) -> bool {
        matches!(
            self,
            Self::PreIncrementAssign
                | Self::PreDecrementAssign
                | Self::PostIncrementAssign
                | Self::PostDecrementAssign
        )
    }

    /// Operators whose result is `bool` regardless of operand types.
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::LessThan
                | Self::LessThanOrEqual
                | Self::GreaterThan
                | Self::GreaterThanOrEqual
        )
    }

    pub const fn is_short_circuit(self) -> bool {
        matches!(self, Self::AndAlso | Self::OrElse)
    }

    /// For a compound assignment, the binary operator it applies.
    pub const fn compound_operator(self) -> Option<NodeType> {
        Some(match self {
            Self::AddAssign => Self::Add,
            Self::AddAssignChecked => Self::AddChecked,
            Self::SubtractAssign => Self::Subtract,
            Self::SubtractAssignChecked => Self::SubtractChecked,
            Self::MultiplyAssign => Self::Multiply,
            Self::MultiplyAssignChecked => Self::MultiplyChecked,
            Self::DivideAssign => Self::Divide,
            Self::ModuloAssign => Self::Modulo,
            Self::PowerAssign => Self::Power,
            Self::AndAssign => Self::And,
            Self::OrAssign => Self::Or,
            Self::ExclusiveOrAssign => Self::ExclusiveOr,
            Self::LeftShiftAssign => Self::LeftShift,
            Self::RightShiftAssign => Self::RightShift,
            _ => return None,
        })
    }

    /// Source-level symbol used when rendering operator nodes.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add | Self::AddChecked | Self::UnaryPlus => "+",
            Self::Subtract | Self::SubtractChecked | Self::Negate | Self::NegateChecked => "-",
            Self::Multiply | Self::MultiplyChecked => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Power => "**",
            Self::And => "&",
            Self::Or => "|",
            Self::ExclusiveOr => "^",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
            Self::AndAlso => "&&",
            Self::OrElse => "||",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::Coalesce => "??",
            Self::Assign => "=",
            Self::AddAssign | Self::AddAssignChecked => "+=",
            Self::SubtractAssign | Self::SubtractAssignChecked => "-=",
            Self::MultiplyAssign | Self::MultiplyAssignChecked => "*=",
            Self::DivideAssign => "/=",
            Self::ModuloAssign => "%=",
            Self::PowerAssign => "**=",
            Self::AndAssign => "&=",
            Self::OrAssign => "|=",
            Self::ExclusiveOrAssign => "^=",
            Self::LeftShiftAssign => "<<=",
            Self::RightShiftAssign => ">>=",
            Self::Not => "!",
            Self::OnesComplement => "~",
            Self::PreIncrementAssign | Self::PostIncrementAssign => "++",
            Self::PreDecrementAssign | Self::PostDecrementAssign => "--",
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_assignments_map_to_their_operator() {
        assert_eq!(NodeType::AddAssign.compound_operator(), Some(NodeType::Add));
        assert_eq!(
            NodeType::SubtractAssignChecked.compound_operator(),
            Some(NodeType::SubtractChecked)
        );
        assert_eq!(NodeType::Assign.compound_operator(), None);
        assert_eq!(NodeType::Add.compound_operator(), None);
    }

    #[test]
    fn families_are_disjoint() {
        for kind in [NodeType::Add, NodeType::Assign, NodeType::LeftShiftAssign] {
            assert!(kind.is_binary());
            assert!(!kind.is_unary());
        }
        for kind in [NodeType::Negate, NodeType::Throw, NodeType::PostIncrementAssign] {
            assert!(kind.is_unary());
            assert!(!kind.is_binary());
        }
        assert!(!NodeType::Block.is_binary());
        assert!(!NodeType::Block.is_unary());
    }

    #[test]
    fn symbols() {
        assert_eq!(NodeType::Add.as_symbol(), "+");
        assert_eq!(NodeType::Coalesce.as_symbol(), "??");
        assert_eq!(NodeType::ModuloAssign.as_symbol(), "%=");
    }
}
