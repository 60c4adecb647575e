use crate::dumper::{Dumpable, Dumper};
use crate::expr::{Expr, ExpressionRewriter, RewriteContext};
use crate::method_info::CONSTRUCTOR_NAME;
use crate::signature::JavaType;

/// Surface form chosen for an [`UnreducedMethodRef`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodRefForm {
    /// `Type::name`
    BareStatic,
    /// `receiver::name`
    BareInstance,
    /// `(arg_0, arg_1) -> target.name(curried..., arg_0, arg_1)`
    ParameterList,
}

impl MethodRefForm {
    fn select(curried: usize, targets: usize, instance: bool) -> Self {
        match (curried, targets, instance) {
            (0, 1, false) => MethodRefForm::BareStatic,
            (1, 1, true) => MethodRefForm::BareInstance,
            _ => MethodRefForm::ParameterList,
        }
    }
}

/// A lambda or method reference call site that was not lowered to an ordinary
/// invocation.
///
/// `curried_args` are the values captured at the call site. For an instance
/// reference the first of them is the receiver.
#[derive(Clone, Debug, PartialEq)]
pub struct UnreducedMethodRef {
    declaring_type: JavaType,
    member_name: String,
    target_parameter_types: Vec<JavaType>,
    curried_args: Vec<Expr>,
    instance: bool,
    result_type: JavaType,
    form: MethodRefForm,
}

impl UnreducedMethodRef {
    pub fn new(
        declaring_type: JavaType,
        member_name: impl Into<String>,
        target_parameter_types: Vec<JavaType>,
        curried_args: Vec<Expr>,
        instance: bool,
        result_type: JavaType,
    ) -> Self {
        let form = MethodRefForm::select(curried_args.len(), target_parameter_types.len(), instance);
        Self {
            declaring_type,
            member_name: member_name.into(),
            target_parameter_types,
            curried_args,
            instance,
            result_type,
            form,
        }
    }

    pub fn declaring_type(&self) -> &JavaType {
        &self.declaring_type
    }

    pub fn member_name(&self) -> &str {
        &self.member_name
    }

    pub fn target_parameter_types(&self) -> &[JavaType] {
        &self.target_parameter_types
    }

    pub fn curried_args(&self) -> &[Expr] {
        &self.curried_args
    }

    pub fn is_instance(&self) -> bool {
        self.instance
    }

    pub fn result_type(&self) -> &JavaType {
        &self.result_type
    }

    pub fn form(&self) -> MethodRefForm {
        self.form
    }

    pub fn is_constructor(&self) -> bool {
        self.member_name == CONSTRUCTOR_NAME
    }

    /// The name as written in source; constructors become `new`.
    pub fn display_name(&self) -> &str {
        if self.is_constructor() {
            "new"
        } else {
            &self.member_name
        }
    }

    /// Rewrite each curried argument in order.
    pub fn apply_expression_rewriter<R>(self, rewriter: &mut R, ctx: &RewriteContext<'_>) -> Self
    where
        R: ExpressionRewriter + ?Sized,
    {
        let curried_args = self
            .curried_args
            .into_iter()
            .map(|arg| rewriter.rewrite_expression(arg, ctx))
            .collect();
        Self {
            curried_args,
            ..self
        }
    }

    fn dump_parameter_list<'d>(&self, d: &'d mut Dumper) -> &'d mut Dumper {
        let placeholders: Vec<String> = (0..self.target_parameter_types.len())
            .map(|i| format!("arg_{}", i))
            .collect();
        if placeholders.len() == 1 {
            d.print(&placeholders[0]);
        } else {
            d.print("(").print(&placeholders.join(", ")).print(")");
        }
        d.print(" -> ");

        // an instance reference without a captured receiver takes it from the
        // first placeholder
        let (receiver, curried, placeholders) = match (self.instance, self.curried_args.split_first()) {
            (true, Some((receiver, rest))) => (Some(Receiver::Captured(receiver)), rest, &placeholders[..]),
            (true, None) => match placeholders.split_first() {
                Some((receiver, rest)) => (Some(Receiver::Placeholder(receiver.as_str())), &[][..], rest),
                None => (None, &[][..], &placeholders[..]),
            },
            (false, _) => (None, &self.curried_args[..], &placeholders[..]),
        };

        if self.is_constructor() && !self.instance {
            d.print("new ").dump(&self.declaring_type);
        } else {
            match receiver {
                Some(Receiver::Captured(expr)) => d.dump(expr),
                Some(Receiver::Placeholder(name)) => d.print(name),
                None => d.dump(&self.declaring_type),
            };
            d.print(".").print(self.display_name());
        }

        d.print("(");
        d.separated(curried, ", ");
        for (i, name) in placeholders.iter().enumerate() {
            if i > 0 || !curried.is_empty() {
                d.print(", ");
            }
            d.print(name);
        }
        d.print(")")
    }
}

enum Receiver<'a> {
    Captured(&'a Expr),
    Placeholder(&'a str),
}

impl Dumpable for UnreducedMethodRef {
    fn dump<'d>(&self, d: &'d mut Dumper) -> &'d mut Dumper {
        match self.form {
            MethodRefForm::BareStatic => d
                .dump(&self.declaring_type)
                .print("::")
                .print(self.display_name()),
            MethodRefForm::BareInstance => match self.curried_args.first() {
                Some(receiver) => d.dump(receiver).print("::").print(self.display_name()),
                None => self.dump_parameter_list(d),
            },
            MethodRefForm::ParameterList => self.dump_parameter_list(d),
        }
    }
}
