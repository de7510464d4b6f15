//! Calls, construction, member access and lambdas.

use std::sync::Arc;

use super::{
    check_arguments, check_instance, check_unique, expect_assignable, same_seq, Identity, Node,
    NodeType, ParameterNode,
};
use crate::capability::{same_handle, ConstructorRef, IndexerRef, MemberRef, MethodRef};
use crate::errors::BuildError;
use crate::types::{FunctionType, Type};

/// A method call on an instance (or a static call when `object` is `None`).
#[derive(Debug)]
pub struct CallNode {
    object: Option<Node>,
    method: MethodRef,
    arguments: Arc<[Node]>,
}

impl CallNode {
    pub fn make(
        object: Option<Node>,
        method: MethodRef,
        arguments: impl Into<Arc<[Node]>>,
    ) -> Result<Arc<Self>, BuildError> {
        let arguments = arguments.into();
        check_instance(method.name(), method.is_static(), object.as_ref())?;
        check_arguments("call", method.parameter_types(), &arguments)?;
        Ok(Arc::new(CallNode {
            object,
            method,
            arguments,
        }))
    }

    pub fn object(&self) -> Option<&Node> {
        self.object.as_ref()
    }

    pub fn method(&self) -> &MethodRef {
        &self.method
    }

    pub fn arguments(&self) -> &Arc<[Node]> {
        &self.arguments
    }

    pub fn value_type(&self) -> &Type {
        self.method.return_type()
    }

    pub fn update(
        self: &Arc<Self>,
        object: Option<Node>,
        arguments: Arc<[Node]>,
    ) -> Result<Arc<Self>, BuildError> {
        if self.object.same(&object) && same_seq(&self.arguments, &arguments) {
            return Ok(Arc::clone(self));
        }
        Self::make(object, self.method.clone(), arguments)
    }
}

/// Invocation of a delegate-typed expression.
#[derive(Debug)]
pub struct InvokeNode {
    expression: Node,
    arguments: Arc<[Node]>,
    ty: Type,
}

impl InvokeNode {
    pub fn make(
        expression: Node,
        arguments: impl Into<Arc<[Node]>>,
    ) -> Result<Arc<Self>, BuildError> {
        let arguments = arguments.into();
        let callee_ty = expression.value_type();
        let Some(signature) = callee_ty.as_function() else {
            return Err(BuildError::TypeMismatch {
                context: "invoke",
                expected: Type::function(Vec::new(), Type::Object),
                found: callee_ty,
            });
        };
        check_arguments("invoke", signature.params(), &arguments)?;
        let ty = signature.ret().clone();
        Ok(Arc::new(InvokeNode {
            expression,
            arguments,
            ty,
        }))
    }

    pub fn expression(&self) -> &Node {
        &self.expression
    }

    pub fn arguments(&self) -> &Arc<[Node]> {
        &self.arguments
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    pub fn update(
        self: &Arc<Self>,
        expression: Node,
        arguments: Arc<[Node]>,
    ) -> Result<Arc<Self>, BuildError> {
        if self.expression.same(&expression) && same_seq(&self.arguments, &arguments) {
            return Ok(Arc::clone(self));
        }
        Self::make(expression, arguments)
    }
}

/// Object construction through a constructor handle.
#[derive(Debug)]
pub struct NewNode {
    constructor: ConstructorRef,
    arguments: Arc<[Node]>,
}

impl NewNode {
    pub fn make(
        constructor: ConstructorRef,
        arguments: impl Into<Arc<[Node]>>,
    ) -> Result<Arc<Self>, BuildError> {
        let arguments = arguments.into();
        check_arguments("new", constructor.parameter_types(), &arguments)?;
        Ok(Arc::new(NewNode {
            constructor,
            arguments,
        }))
    }

    pub fn constructor(&self) -> &ConstructorRef {
        &self.constructor
    }

    pub fn arguments(&self) -> &Arc<[Node]> {
        &self.arguments
    }

    pub fn value_type(&self) -> &Type {
        self.constructor.declaring_type()
    }

    pub fn update(self: &Arc<Self>, arguments: Arc<[Node]>) -> Result<Arc<Self>, BuildError> {
        if same_seq(&self.arguments, &arguments) {
            return Ok(Arc::clone(self));
        }
        Self::make(self.constructor.clone(), arguments)
    }
}

/// `NewArrayInit` (explicit elements) or `NewArrayBounds` (sizes).
#[derive(Debug)]
pub struct NewArrayNode {
    node_type: NodeType,
    element_type: Type,
    expressions: Arc<[Node]>,
    ty: Type,
}

impl NewArrayNode {
    pub fn make(
        node_type: NodeType,
        element_type: Type,
        expressions: impl Into<Arc<[Node]>>,
    ) -> Result<Arc<Self>, BuildError> {
        let expressions = expressions.into();
        match node_type {
            NodeType::NewArrayInit => {
                for item in expressions.iter() {
                    expect_assignable("array element", &element_type, &item.value_type())?;
                }
            }
            NodeType::NewArrayBounds => {
                if expressions.is_empty() {
                    return Err(BuildError::Invalid("array bounds require at least one size"));
                }
                for bound in expressions.iter() {
                    let bound_ty = bound.value_type();
                    if !bound_ty.is_integer() {
                        return Err(BuildError::TypeMismatch {
                            context: "array bound",
                            expected: Type::Int32,
                            found: bound_ty,
                        });
                    }
                }
            }
            _ => {
                return Err(BuildError::WrongFamily {
                    node_type,
                    family: "array creation",
                })
            }
        }
        let ty = Type::array_of(element_type.clone());
        Ok(Arc::new(NewArrayNode {
            node_type,
            element_type,
            expressions,
            ty,
        }))
    }

    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn element_type(&self) -> &Type {
        &self.element_type
    }

    pub fn expressions(&self) -> &Arc<[Node]> {
        &self.expressions
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    pub fn update(self: &Arc<Self>, expressions: Arc<[Node]>) -> Result<Arc<Self>, BuildError> {
        if same_seq(&self.expressions, &expressions) {
            return Ok(Arc::clone(self));
        }
        Self::make(self.node_type, self.element_type.clone(), expressions)
    }
}

/// Field or property read (`expression` is `None` for static members).
#[derive(Debug)]
pub struct MemberNode {
    expression: Option<Node>,
    member: MemberRef,
}

impl MemberNode {
    pub fn make(expression: Option<Node>, member: MemberRef) -> Result<Arc<Self>, BuildError> {
        check_instance(member.name(), member.is_static(), expression.as_ref())?;
        Ok(Arc::new(MemberNode { expression, member }))
    }

    pub fn expression(&self) -> Option<&Node> {
        self.expression.as_ref()
    }

    pub fn member(&self) -> &MemberRef {
        &self.member
    }

    pub fn value_type(&self) -> &Type {
        self.member.member_type()
    }

    pub fn update(self: &Arc<Self>, expression: Option<Node>) -> Result<Arc<Self>, BuildError> {
        if self.expression.same(&expression) {
            return Ok(Arc::clone(self));
        }
        Self::make(expression, self.member.clone())
    }
}

/// Array element or indexed-property access.
///
/// Without an indexer the object must be a one-dimensional array and there
/// must be exactly one integer argument.
#[derive(Debug)]
pub struct IndexNode {
    object: Node,
    indexer: Option<IndexerRef>,
    arguments: Arc<[Node]>,
    ty: Type,
}

impl IndexNode {
    pub fn make(
        object: Node,
        indexer: Option<IndexerRef>,
        arguments: impl Into<Arc<[Node]>>,
    ) -> Result<Arc<Self>, BuildError> {
        let arguments = arguments.into();
        let ty = match &indexer {
            Some(indexer) => {
                check_arguments("indexer", indexer.parameter_types(), &arguments)?;
                indexer.item_type().clone()
            }
            None => {
                let object_ty = object.value_type();
                let Type::Array(element) = &object_ty else {
                    return Err(BuildError::TypeMismatch {
                        context: "array index",
                        expected: Type::array_of(Type::Object),
                        found: object_ty,
                    });
                };
                if arguments.len() != 1 {
                    return Err(BuildError::ArgumentCount {
                        context: "array index",
                        expected: 1,
                        found: arguments.len(),
                    });
                }
                let index_ty = arguments[0].value_type();
                if !index_ty.is_integer() {
                    return Err(BuildError::TypeMismatch {
                        context: "array index",
                        expected: Type::Int32,
                        found: index_ty,
                    });
                }
                element.as_ref().clone()
            }
        };
        Ok(Arc::new(IndexNode {
            object,
            indexer,
            arguments,
            ty,
        }))
    }

    pub fn object(&self) -> &Node {
        &self.object
    }

    pub fn indexer(&self) -> Option<&IndexerRef> {
        self.indexer.as_ref()
    }

    pub fn arguments(&self) -> &Arc<[Node]> {
        &self.arguments
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    pub fn update(
        self: &Arc<Self>,
        object: Node,
        arguments: Arc<[Node]>,
    ) -> Result<Arc<Self>, BuildError> {
        if self.object.same(&object) && same_seq(&self.arguments, &arguments) {
            return Ok(Arc::clone(self));
        }
        Self::make(object, self.indexer.clone(), arguments)
    }
}

/// A body bound to an ordered list of unique parameters.
#[derive(Debug)]
pub struct LambdaNode {
    name: Option<Arc<str>>,
    body: Node,
    parameters: Arc<[Arc<ParameterNode>]>,
    signature: Arc<FunctionType>,
    ty: Type,
}

impl LambdaNode {
    /// `return_type` defaults to the body's type. An explicit `void`
    /// accepts any body and discards its value.
    pub fn make(
        name: Option<&str>,
        body: Node,
        parameters: impl Into<Arc<[Arc<ParameterNode>]>>,
        return_type: Option<Type>,
    ) -> Result<Arc<Self>, BuildError> {
        let parameters = parameters.into();
        check_unique(&parameters)?;
        let body_ty = body.value_type();
        let return_type = match return_type {
            Some(ty) if ty.is_void() => ty,
            Some(ty) => {
                expect_assignable("lambda body", &ty, &body_ty)?;
                ty
            }
            None => body_ty,
        };
        let signature = Arc::new(FunctionType::new(
            parameters.iter().map(|p| p.value_type().clone()).collect(),
            return_type,
        ));
        let ty = Type::Function(Arc::clone(&signature));
        Ok(Arc::new(LambdaNode {
            name: name.map(Arc::from),
            body,
            parameters,
            signature,
            ty,
        }))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn body(&self) -> &Node {
        &self.body
    }

    pub fn parameters(&self) -> &Arc<[Arc<ParameterNode>]> {
        &self.parameters
    }

    pub fn return_type(&self) -> &Type {
        self.signature.ret()
    }

    /// The delegate signature.
    pub fn signature(&self) -> &Arc<FunctionType> {
        &self.signature
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    pub fn update(
        self: &Arc<Self>,
        body: Node,
        parameters: Arc<[Arc<ParameterNode>]>,
    ) -> Result<Arc<Self>, BuildError> {
        if self.body.same(&body) && same_seq(&self.parameters, &parameters) {
            return Ok(Arc::clone(self));
        }
        Self::make(
            self.name.as_deref(),
            body,
            parameters,
            Some(self.signature.ret().clone()),
        )
    }
}

/// One element-add call of a list initializer.
#[derive(Debug)]
pub struct ElementInit {
    add_method: MethodRef,
    arguments: Arc<[Node]>,
}

impl ElementInit {
    pub fn make(
        add_method: MethodRef,
        arguments: impl Into<Arc<[Node]>>,
    ) -> Result<Arc<Self>, BuildError> {
        let arguments = arguments.into();
        if add_method.is_static() {
            return Err(BuildError::Invalid("element initializers need an instance method"));
        }
        check_arguments("element initializer", add_method.parameter_types(), &arguments)?;
        Ok(Arc::new(ElementInit {
            add_method,
            arguments,
        }))
    }

    pub fn add_method(&self) -> &MethodRef {
        &self.add_method
    }

    pub fn arguments(&self) -> &Arc<[Node]> {
        &self.arguments
    }

    pub fn update(self: &Arc<Self>, arguments: Arc<[Node]>) -> Result<Arc<Self>, BuildError> {
        if same_seq(&self.arguments, &arguments) {
            return Ok(Arc::clone(self));
        }
        Self::make(self.add_method.clone(), arguments)
    }
}

/// Constructor call followed by element-add calls.
#[derive(Debug)]
pub struct ListInitNode {
    new_expression: Arc<NewNode>,
    initializers: Arc<[Arc<ElementInit>]>,
}

impl ListInitNode {
    pub fn make(
        new_expression: Arc<NewNode>,
        initializers: impl Into<Arc<[Arc<ElementInit>]>>,
    ) -> Result<Arc<Self>, BuildError> {
        let initializers = initializers.into();
        if initializers.is_empty() {
            return Err(BuildError::Invalid("list initializer has no elements"));
        }
        Ok(Arc::new(ListInitNode {
            new_expression,
            initializers,
        }))
    }

    pub fn new_expression(&self) -> &Arc<NewNode> {
        &self.new_expression
    }

    pub fn initializers(&self) -> &Arc<[Arc<ElementInit>]> {
        &self.initializers
    }

    pub fn value_type(&self) -> &Type {
        self.new_expression.value_type()
    }

    pub fn update(
        self: &Arc<Self>,
        new_expression: Arc<NewNode>,
        initializers: Arc<[Arc<ElementInit>]>,
    ) -> Result<Arc<Self>, BuildError> {
        if Arc::ptr_eq(&self.new_expression, &new_expression)
            && same_seq(&self.initializers, &initializers)
        {
            return Ok(Arc::clone(self));
        }
        Self::make(new_expression, initializers)
    }
}

/// One binding of a member initializer.
#[derive(Debug)]
pub enum MemberBinding {
    /// `member = expression`
    Assignment { member: MemberRef, expression: Node },
    /// `member = { nested bindings }` applied to the existing member object.
    Member {
        member: MemberRef,
        bindings: Arc<[Arc<MemberBinding>]>,
    },
    /// `member = { element-add calls }` applied to the existing collection.
    List {
        member: MemberRef,
        initializers: Arc<[Arc<ElementInit>]>,
    },
}

impl MemberBinding {
    pub fn assignment(member: MemberRef, expression: Node) -> Result<Arc<Self>, BuildError> {
        if !member.can_write() {
            return Err(BuildError::ReadOnlyMember {
                member: member.name().to_string(),
            });
        }
        expect_assignable("member binding", member.member_type(), &expression.value_type())?;
        Ok(Arc::new(MemberBinding::Assignment { member, expression }))
    }

    pub fn member(
        member: MemberRef,
        bindings: impl Into<Arc<[Arc<MemberBinding>]>>,
    ) -> Result<Arc<Self>, BuildError> {
        if member.is_static() {
            return Err(BuildError::StaticWithInstance {
                member: member.name().to_string(),
            });
        }
        Ok(Arc::new(MemberBinding::Member {
            member,
            bindings: bindings.into(),
        }))
    }

    pub fn list(
        member: MemberRef,
        initializers: impl Into<Arc<[Arc<ElementInit>]>>,
    ) -> Result<Arc<Self>, BuildError> {
        Ok(Arc::new(MemberBinding::List {
            member,
            initializers: initializers.into(),
        }))
    }

    /// Rebuild an `Assignment` binding around a new value expression.
    pub fn update_assignment(self: &Arc<Self>, expression: Node) -> Result<Arc<Self>, BuildError> {
        match self.as_ref() {
            MemberBinding::Assignment {
                member,
                expression: current,
            } => {
                if current.same(&expression) {
                    Ok(Arc::clone(self))
                } else {
                    Self::assignment(member.clone(), expression)
                }
            }
            _ => Err(BuildError::Invalid("not an assignment binding")),
        }
    }

    /// Rebuild a nested `Member` binding around new inner bindings.
    pub fn update_bindings(
        self: &Arc<Self>,
        bindings: Arc<[Arc<MemberBinding>]>,
    ) -> Result<Arc<Self>, BuildError> {
        match self.as_ref() {
            MemberBinding::Member {
                member,
                bindings: current,
            } => {
                if same_seq(current, &bindings) {
                    Ok(Arc::clone(self))
                } else {
                    Self::member(member.clone(), bindings)
                }
            }
            _ => Err(BuildError::Invalid("not a nested member binding")),
        }
    }

    /// Rebuild a `List` binding around new element initializers.
    pub fn update_initializers(
        self: &Arc<Self>,
        initializers: Arc<[Arc<ElementInit>]>,
    ) -> Result<Arc<Self>, BuildError> {
        match self.as_ref() {
            MemberBinding::List {
                member,
                initializers: current,
            } => {
                if same_seq(current, &initializers) {
                    Ok(Arc::clone(self))
                } else {
                    Self::list(member.clone(), initializers)
                }
            }
            _ => Err(BuildError::Invalid("not a list binding")),
        }
    }

    pub fn member_handle(&self) -> &MemberRef {
        match self {
            MemberBinding::Assignment { member, .. }
            | MemberBinding::Member { member, .. }
            | MemberBinding::List { member, .. } => member,
        }
    }
}

/// Constructor call followed by member bindings.
#[derive(Debug)]
pub struct MemberInitNode {
    new_expression: Arc<NewNode>,
    bindings: Arc<[Arc<MemberBinding>]>,
}

impl MemberInitNode {
    pub fn make(
        new_expression: Arc<NewNode>,
        bindings: impl Into<Arc<[Arc<MemberBinding>]>>,
    ) -> Result<Arc<Self>, BuildError> {
        let bindings: Arc<[Arc<MemberBinding>]> = bindings.into();
        for (i, binding) in bindings.iter().enumerate() {
            let handle = binding.member_handle();
            if bindings[..i]
                .iter()
                .any(|earlier| same_handle(earlier.member_handle(), handle))
            {
                return Err(BuildError::Invalid("member bound more than once"));
            }
        }
        Ok(Arc::new(MemberInitNode {
            new_expression,
            bindings,
        }))
    }

    pub fn new_expression(&self) -> &Arc<NewNode> {
        &self.new_expression
    }

    pub fn bindings(&self) -> &Arc<[Arc<MemberBinding>]> {
        &self.bindings
    }

    pub fn value_type(&self) -> &Type {
        self.new_expression.value_type()
    }

    pub fn update(
        self: &Arc<Self>,
        new_expression: Arc<NewNode>,
        bindings: Arc<[Arc<MemberBinding>]>,
    ) -> Result<Arc<Self>, BuildError> {
        if Arc::ptr_eq(&self.new_expression, &new_expression)
            && same_seq(&self.bindings, &bindings)
        {
            return Ok(Arc::clone(self));
        }
        Self::make(new_expression, bindings)
    }
}
