//! Control flow: conditionals, blocks, loops, jumps, switch and try.

use std::sync::Arc;

use super::{
    check_unique, expect_assignable, same_seq, Identity, LabelTarget, Node, NodeType,
    ParameterNode,
};
use crate::capability::MethodRef;
use crate::errors::BuildError;
use crate::types::{BuiltinClass, Type};

/// Branch bodies must fit a non-void result type. A jump or throw never
/// completes, so it fits anywhere.
fn check_branch(context: &'static str, ty: &Type, branch: &Node) -> Result<(), BuildError> {
    let diverges = match branch {
        Node::Goto(_) => true,
        Node::Unary(u) => u.node_type() == NodeType::Throw,
        _ => false,
    };
    if ty.is_void() || diverges {
        Ok(())
    } else {
        expect_assignable(context, ty, &branch.value_type())
    }
}

/// `test ? if_true : if_false`
#[derive(Debug)]
pub struct ConditionalNode {
    test: Node,
    if_true: Node,
    if_false: Node,
    ty: Type,
}

impl ConditionalNode {
    /// `ty` defaults to the type of `if_true`; an explicit `void` allows the
    /// branches to disagree.
    pub fn make(
        test: Node,
        if_true: Node,
        if_false: Node,
        ty: Option<Type>,
    ) -> Result<Arc<Self>, BuildError> {
        let test_ty = test.value_type();
        if !test_ty.is_bool() {
            return Err(BuildError::TypeMismatch {
                context: "conditional test",
                expected: Type::Bool,
                found: test_ty,
            });
        }
        let ty = ty.unwrap_or_else(|| if_true.value_type());
        check_branch("conditional branch", &ty, &if_true)?;
        check_branch("conditional branch", &ty, &if_false)?;
        Ok(Arc::new(ConditionalNode {
            test,
            if_true,
            if_false,
            ty,
        }))
    }

    pub fn test(&self) -> &Node {
        &self.test
    }

    pub fn if_true(&self) -> &Node {
        &self.if_true
    }

    pub fn if_false(&self) -> &Node {
        &self.if_false
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    pub fn update(
        self: &Arc<Self>,
        test: Node,
        if_true: Node,
        if_false: Node,
    ) -> Result<Arc<Self>, BuildError> {
        if self.test.same(&test) && self.if_true.same(&if_true) && self.if_false.same(&if_false) {
            return Ok(Arc::clone(self));
        }
        Self::make(test, if_true, if_false, Some(self.ty.clone()))
    }
}

/// A sequence of expressions with optional block-scoped variables.
#[derive(Debug)]
pub struct BlockNode {
    variables: Arc<[Arc<ParameterNode>]>,
    expressions: Arc<[Node]>,
    ty: Type,
}

impl BlockNode {
    /// `ty` defaults to the last expression's type (`void` when empty).
    pub fn make(
        variables: impl Into<Arc<[Arc<ParameterNode>]>>,
        expressions: impl Into<Arc<[Node]>>,
        ty: Option<Type>,
    ) -> Result<Arc<Self>, BuildError> {
        let variables = variables.into();
        let expressions = expressions.into();
        check_unique(&variables)?;
        let last_ty = expressions.last().map_or(Type::Void, Node::value_type);
        let ty = match ty {
            Some(ty) => {
                if let Some(last) = expressions.last() {
                    check_branch("block result", &ty, last)?;
                }
                ty
            }
            None => last_ty,
        };
        Ok(Arc::new(BlockNode {
            variables,
            expressions,
            ty,
        }))
    }

    pub fn variables(&self) -> &Arc<[Arc<ParameterNode>]> {
        &self.variables
    }

    pub fn expressions(&self) -> &Arc<[Node]> {
        &self.expressions
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    pub fn update(
        self: &Arc<Self>,
        variables: Arc<[Arc<ParameterNode>]>,
        expressions: Arc<[Node]>,
    ) -> Result<Arc<Self>, BuildError> {
        if same_seq(&self.variables, &variables) && same_seq(&self.expressions, &expressions) {
            return Ok(Arc::clone(self));
        }
        Self::make(variables, expressions, Some(self.ty.clone()))
    }
}

/// Repeats `body` until a jump to `break_label` leaves it.
#[derive(Debug)]
pub struct LoopNode {
    body: Node,
    break_label: Option<LabelTarget>,
    continue_label: Option<LabelTarget>,
    ty: Type,
}

impl LoopNode {
    pub fn make(
        body: Node,
        break_label: Option<LabelTarget>,
        continue_label: Option<LabelTarget>,
    ) -> Result<Arc<Self>, BuildError> {
        if let Some(label) = &continue_label {
            if !label.value_type().is_void() {
                return Err(BuildError::TypeMismatch {
                    context: "continue label",
                    expected: Type::Void,
                    found: label.value_type().clone(),
                });
            }
        }
        let ty = break_label
            .as_ref()
            .map_or(Type::Void, |label| label.value_type().clone());
        Ok(Arc::new(LoopNode {
            body,
            break_label,
            continue_label,
            ty,
        }))
    }

    pub fn body(&self) -> &Node {
        &self.body
    }

    pub fn break_label(&self) -> Option<&LabelTarget> {
        self.break_label.as_ref()
    }

    pub fn continue_label(&self) -> Option<&LabelTarget> {
        self.continue_label.as_ref()
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    pub fn update(
        self: &Arc<Self>,
        break_label: Option<LabelTarget>,
        continue_label: Option<LabelTarget>,
        body: Node,
    ) -> Result<Arc<Self>, BuildError> {
        if self.body.same(&body)
            && self.break_label == break_label
            && self.continue_label == continue_label
        {
            return Ok(Arc::clone(self));
        }
        Self::make(body, break_label, continue_label)
    }
}

/// A jump destination inside a block.
///
/// Reached normally it yields `default_value` (or the zero value of the
/// target type); reached by a jump it yields the carried value.
#[derive(Debug)]
pub struct LabelNode {
    target: LabelTarget,
    default_value: Option<Node>,
}

impl LabelNode {
    pub fn make(target: LabelTarget, default_value: Option<Node>) -> Result<Arc<Self>, BuildError> {
        if let Some(default_value) = &default_value {
            check_branch("label default", target.value_type(), default_value)?;
        }
        Ok(Arc::new(LabelNode {
            target,
            default_value,
        }))
    }

    pub fn target(&self) -> &LabelTarget {
        &self.target
    }

    pub fn default_value(&self) -> Option<&Node> {
        self.default_value.as_ref()
    }

    pub fn value_type(&self) -> &Type {
        self.target.value_type()
    }

    pub fn update(
        self: &Arc<Self>,
        target: LabelTarget,
        default_value: Option<Node>,
    ) -> Result<Arc<Self>, BuildError> {
        if self.target == target && self.default_value.same(&default_value) {
            return Ok(Arc::clone(self));
        }
        Self::make(target, default_value)
    }
}

/// What a `Goto` is used for. Informational; every kind jumps the same way.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum GotoKind {
    Goto,
    Break,
    Continue,
    Return,
}

impl GotoKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            GotoKind::Goto => "goto",
            GotoKind::Break => "break",
            GotoKind::Continue => "continue",
            GotoKind::Return => "return",
        }
    }
}

/// A jump to `target`, optionally carrying a value.
#[derive(Debug)]
pub struct GotoNode {
    kind: GotoKind,
    target: LabelTarget,
    value: Option<Node>,
    ty: Type,
}

impl GotoNode {
    /// `ty` is the static type of the jump expression itself (`void` when
    /// omitted); control never returns from a taken jump.
    pub fn make(
        kind: GotoKind,
        target: LabelTarget,
        value: Option<Node>,
        ty: Option<Type>,
    ) -> Result<Arc<Self>, BuildError> {
        match (&value, target.value_type().is_void()) {
            (Some(_), true) => {
                return Err(BuildError::Invalid("jump to a void label cannot carry a value"));
            }
            (None, false) => {
                return Err(BuildError::Invalid("jump to a typed label requires a value"));
            }
            (Some(value), false) => {
                expect_assignable("jump value", target.value_type(), &value.value_type())?;
            }
            (None, true) => {}
        }
        Ok(Arc::new(GotoNode {
            kind,
            target,
            value,
            ty: ty.unwrap_or(Type::Void),
        }))
    }

    pub fn kind(&self) -> GotoKind {
        self.kind
    }

    pub fn target(&self) -> &LabelTarget {
        &self.target
    }

    pub fn value(&self) -> Option<&Node> {
        self.value.as_ref()
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    pub fn update(
        self: &Arc<Self>,
        target: LabelTarget,
        value: Option<Node>,
    ) -> Result<Arc<Self>, BuildError> {
        if self.target == target && self.value.same(&value) {
            return Ok(Arc::clone(self));
        }
        Self::make(self.kind, target, value, Some(self.ty.clone()))
    }
}

/// One `case` of a switch: any of `test_values` selects `body`.
#[derive(Debug)]
pub struct SwitchCase {
    test_values: Arc<[Node]>,
    body: Node,
}

impl SwitchCase {
    pub fn make(test_values: impl Into<Arc<[Node]>>, body: Node) -> Result<Arc<Self>, BuildError> {
        let test_values = test_values.into();
        if test_values.is_empty() {
            return Err(BuildError::Invalid("switch case has no test values"));
        }
        Ok(Arc::new(SwitchCase { test_values, body }))
    }

    pub fn test_values(&self) -> &Arc<[Node]> {
        &self.test_values
    }

    pub fn body(&self) -> &Node {
        &self.body
    }

    pub fn update(
        self: &Arc<Self>,
        test_values: Arc<[Node]>,
        body: Node,
    ) -> Result<Arc<Self>, BuildError> {
        if same_seq(&self.test_values, &test_values) && self.body.same(&body) {
            return Ok(Arc::clone(self));
        }
        Self::make(test_values, body)
    }
}

/// Multi-way branch on one value. First matching case wins; no fallthrough.
#[derive(Debug)]
pub struct SwitchNode {
    switch_value: Node,
    cases: Arc<[Arc<SwitchCase>]>,
    default_body: Option<Node>,
    comparer: Option<MethodRef>,
    ty: Type,
}

impl SwitchNode {
    /// `ty` defaults to the first case body's type (or the default body's
    /// when there are no cases).
    pub fn make(
        switch_value: Node,
        cases: impl Into<Arc<[Arc<SwitchCase>]>>,
        default_body: Option<Node>,
        comparer: Option<MethodRef>,
        ty: Option<Type>,
    ) -> Result<Arc<Self>, BuildError> {
        let cases = cases.into();
        if cases.is_empty() && default_body.is_none() {
            return Err(BuildError::Invalid("switch needs a case or a default body"));
        }
        if let Some(comparer) = &comparer {
            if !comparer.is_static() || comparer.parameter_types().len() != 2 {
                return Err(BuildError::Invalid(
                    "switch comparer must be a static method of two parameters",
                ));
            }
            if !comparer.return_type().is_bool() {
                return Err(BuildError::TypeMismatch {
                    context: "switch comparer",
                    expected: Type::Bool,
                    found: comparer.return_type().clone(),
                });
            }
        } else {
            let switch_ty = switch_value.value_type();
            for test in cases.iter().flat_map(|case| case.test_values.iter()) {
                let test_ty = test.value_type();
                if !switch_ty.is_assignable_from(&test_ty) && !test_ty.is_assignable_from(&switch_ty)
                {
                    return Err(BuildError::TypeMismatch {
                        context: "switch case value",
                        expected: switch_ty,
                        found: test_ty,
                    });
                }
            }
        }

        let ty = match ty {
            Some(ty) => ty,
            None => cases
                .first()
                .map(|case| case.body.value_type())
                .or_else(|| default_body.as_ref().map(Node::value_type))
                .unwrap_or(Type::Void),
        };
        for case in cases.iter() {
            check_branch("switch case body", &ty, &case.body)?;
        }
        if let Some(default_body) = &default_body {
            check_branch("switch default body", &ty, default_body)?;
        }

        Ok(Arc::new(SwitchNode {
            switch_value,
            cases,
            default_body,
            comparer,
            ty,
        }))
    }

    pub fn switch_value(&self) -> &Node {
        &self.switch_value
    }

    pub fn cases(&self) -> &Arc<[Arc<SwitchCase>]> {
        &self.cases
    }

    pub fn default_body(&self) -> Option<&Node> {
        self.default_body.as_ref()
    }

    pub fn comparer(&self) -> Option<&MethodRef> {
        self.comparer.as_ref()
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    pub fn update(
        self: &Arc<Self>,
        switch_value: Node,
        cases: Arc<[Arc<SwitchCase>]>,
        default_body: Option<Node>,
    ) -> Result<Arc<Self>, BuildError> {
        if self.switch_value.same(&switch_value)
            && same_seq(&self.cases, &cases)
            && self.default_body.same(&default_body)
        {
            return Ok(Arc::clone(self));
        }
        Self::make(
            switch_value,
            cases,
            default_body,
            self.comparer.clone(),
            Some(self.ty.clone()),
        )
    }
}

/// One `catch` handler.
#[derive(Debug)]
pub struct CatchClause {
    test: Type,
    variable: Option<Arc<ParameterNode>>,
    filter: Option<Node>,
    body: Node,
}

impl CatchClause {
    pub fn make(
        test: Type,
        variable: Option<Arc<ParameterNode>>,
        filter: Option<Node>,
        body: Node,
    ) -> Result<Arc<Self>, BuildError> {
        if !test.is_catchable() {
            return Err(BuildError::TypeMismatch {
                context: "catch type",
                expected: BuiltinClass::Exception.to_type(),
                found: test,
            });
        }
        if let Some(variable) = &variable {
            expect_assignable("catch variable", variable.value_type(), &test)?;
        }
        if let Some(filter) = &filter {
            let filter_ty = filter.value_type();
            if !filter_ty.is_bool() {
                return Err(BuildError::TypeMismatch {
                    context: "catch filter",
                    expected: Type::Bool,
                    found: filter_ty,
                });
            }
        }
        Ok(Arc::new(CatchClause {
            test,
            variable,
            filter,
            body,
        }))
    }

    /// The exception type this handler catches.
    pub fn test(&self) -> &Type {
        &self.test
    }

    pub fn variable(&self) -> Option<&Arc<ParameterNode>> {
        self.variable.as_ref()
    }

    pub fn filter(&self) -> Option<&Node> {
        self.filter.as_ref()
    }

    pub fn body(&self) -> &Node {
        &self.body
    }

    pub fn update(
        self: &Arc<Self>,
        variable: Option<Arc<ParameterNode>>,
        filter: Option<Node>,
        body: Node,
    ) -> Result<Arc<Self>, BuildError> {
        if self.variable.same(&variable) && self.filter.same(&filter) && self.body.same(&body) {
            return Ok(Arc::clone(self));
        }
        Self::make(self.test.clone(), variable, filter, body)
    }
}

/// `try { body } catch ... finally { } | fault { }`
#[derive(Debug)]
pub struct TryNode {
    body: Node,
    handlers: Arc<[Arc<CatchClause>]>,
    finally: Option<Node>,
    fault: Option<Node>,
    ty: Type,
}

impl TryNode {
    pub fn make(
        body: Node,
        handlers: impl Into<Arc<[Arc<CatchClause>]>>,
        finally: Option<Node>,
        fault: Option<Node>,
    ) -> Result<Arc<Self>, BuildError> {
        let handlers = handlers.into();
        if finally.is_some() && fault.is_some() {
            return Err(BuildError::Invalid("try cannot have both finally and fault"));
        }
        if handlers.is_empty() && finally.is_none() && fault.is_none() {
            return Err(BuildError::Invalid("try needs a handler, finally or fault"));
        }
        let ty = body.value_type();
        for handler in handlers.iter() {
            check_branch("catch body", &ty, &handler.body)?;
        }
        Ok(Arc::new(TryNode {
            body,
            handlers,
            finally,
            fault,
            ty,
        }))
    }

    pub fn body(&self) -> &Node {
        &self.body
    }

    pub fn handlers(&self) -> &Arc<[Arc<CatchClause>]> {
        &self.handlers
    }

    pub fn finally(&self) -> Option<&Node> {
        self.finally.as_ref()
    }

    pub fn fault(&self) -> Option<&Node> {
        self.fault.as_ref()
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    pub fn update(
        self: &Arc<Self>,
        body: Node,
        handlers: Arc<[Arc<CatchClause>]>,
        finally: Option<Node>,
        fault: Option<Node>,
    ) -> Result<Arc<Self>, BuildError> {
        if self.body.same(&body)
            && same_seq(&self.handlers, &handlers)
            && self.finally.same(&finally)
            && self.fault.same(&fault)
        {
            return Ok(Arc::clone(self));
        }
        Self::make(body, handlers, finally, fault)
    }
}
