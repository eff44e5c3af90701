use indexmap::IndexSet;
use syn::ext::IdentExt;
use syn::visit::Visit;

/// Names of the fields a function body reads or writes through `param`,
/// in first-use order. Only direct accesses count: `param.a.b` yields `a`.
pub(crate) fn accessed_members(block: &syn::Block, param: &syn::Ident) -> Vec<String> {
    let mut visitor = FieldAccess {
        param,
        members: IndexSet::new(),
    };
    visitor.visit_block(block);
    visitor.members.into_iter().collect()
}

struct FieldAccess<'a> {
    param: &'a syn::Ident,
    members: IndexSet<String>,
}

impl<'ast> Visit<'ast> for FieldAccess<'_> {
    fn visit_expr_field(&mut self, node: &'ast syn::ExprField) {
        if let (syn::Expr::Path(base), syn::Member::Named(member)) = (&*node.base, &node.member) {
            if base.qself.is_none() && base.path.is_ident(self.param) {
                self.members.insert(member.unraw().to_string());
            }
        }
        syn::visit::visit_expr_field(self, node);
    }
}

/// How a function body builds the value it returns.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Construction {
    /// A struct literal setting these fields
    Literal(Vec<String>),

    /// A call to an associated function, `Owner::function(..)`
    Call {
        owner: Option<String>,
        function: String,
    },
}

/// Inspects the expression a body evaluates to.
pub(crate) fn construction(block: &syn::Block) -> Option<Construction> {
    match block.stmts.last()? {
        syn::Stmt::Expr(tail, None) => construction_of(tail),
        syn::Stmt::Expr(tail @ syn::Expr::Return(_), Some(_)) => construction_of(tail),
        _ => None,
    }
}

fn construction_of(expr: &syn::Expr) -> Option<Construction> {
    match expr {
        syn::Expr::Paren(expr) => construction_of(&expr.expr),
        syn::Expr::Group(expr) => construction_of(&expr.expr),
        syn::Expr::Block(expr) => construction(&expr.block),
        syn::Expr::Return(expr) => construction_of(expr.expr.as_deref()?),
        syn::Expr::Struct(expr) => Some(Construction::Literal(
            expr.fields
                .iter()
                .filter_map(|field| match &field.member {
                    syn::Member::Named(ident) => Some(ident.unraw().to_string()),
                    syn::Member::Unnamed(_) => None,
                })
                .collect(),
        )),
        syn::Expr::Call(call) => {
            let syn::Expr::Path(func) = &*call.func else {
                return None;
            };
            let segments: Vec<_> = func.path.segments.iter().collect();
            let (function, owner) = match segments[..] {
                [.., owner, function] => (function, Some(owner.ident.unraw().to_string())),
                [function] => (function, None),
                [] => return None,
            };
            Some(Construction::Call {
                owner,
                function: function.ident.unraw().to_string(),
            })
        }
        _ => None,
    }
}
