use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Expr, FnArg, Ident, ItemFn, LitStr, Pat, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input,
    spanned::Spanned,
};

struct GuardArgs {
    name: Option<String>,
    when: Option<Expr>,
}

impl Parse for GuardArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut name = None;
        let mut when = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "name" => {
                    let lit: LitStr = input.parse()?;
                    name = Some(lit.value());
                }
                "when" => {
                    let expr: Expr = input.parse()?;
                    when = Some(expr);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown guard attribute: {other}"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(GuardArgs { name, when })
    }
}

// The binding of a `&Route` argument.
fn route_arg(arg: &FnArg) -> syn::Result<Ident> {
    let FnArg::Typed(pat_type) = arg else {
        return Err(syn::Error::new_spanned(arg, "guards are free functions, not methods"));
    };
    if !matches!(&*pat_type.ty, Type::Reference(_)) {
        return Err(syn::Error::new_spanned(
            &pat_type.ty,
            "guard arguments must be route references (&Route)",
        ));
    }
    match &*pat_type.pat {
        Pat::Ident(pat) => Ok(pat.ident.clone()),
        Pat::Wild(wild) => Ok(Ident::new("_", wild.span())),
        other => Err(syn::Error::new_spanned(other, "expected a plain binding")),
    }
}

pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as GuardArgs);
    let input = parse_macro_input!(item as ItemFn);

    let fn_name = &input.sig.ident;
    let fn_vis = &input.vis;
    let fn_block = &input.block;

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(&input.sig.fn_token, "guard function must be async")
            .to_compile_error()
            .into();
    }

    let mut inputs = input.sig.inputs.iter();
    let to = match inputs.next().map(route_arg) {
        Some(Ok(ident)) => ident,
        Some(Err(err)) => return err.to_compile_error().into(),
        None => {
            return syn::Error::new_spanned(
                &input.sig,
                "guard function must take the target route: fn(to: &Route)",
            )
            .to_compile_error()
            .into();
        }
    };
    let from = match inputs.next().map(route_arg) {
        Some(Ok(ident)) => ident,
        Some(Err(err)) => return err.to_compile_error().into(),
        None => format_ident!("_from"),
    };
    if let Some(extra) = inputs.next() {
        return syn::Error::new_spanned(extra, "guard function takes at most two routes")
            .to_compile_error()
            .into();
    }

    // `_` cannot be referenced by the `when` predicate.
    let to = if to == "_" { format_ident!("_to") } else { to };
    let from = if from == "_" { format_ident!("_from") } else { from };

    let struct_name = match &args.name {
        Some(custom) => Ident::new(custom, fn_name.span()),
        None => fn_name.clone(),
    };

    let when_check = args.when.as_ref().map(|predicate| {
        quote! {
            if !(#predicate)(#to, #from) {
                return ::core::result::Result::Ok(::waypoint::Next::Continue);
            }
        }
    });

    let expanded = quote! {
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, Default)]
        #[doc = concat!("Navigation guard generated from `", stringify!(#fn_name), "`")]
        #fn_vis struct #struct_name;

        impl ::waypoint::Guard for #struct_name {
            async fn check(
                &self,
                #to: &::waypoint::Route,
                #from: &::waypoint::Route,
            ) -> ::core::result::Result<::waypoint::Next, ::waypoint::BoxError> {
                #when_check
                #fn_block
            }
        }
    };

    TokenStream::from(expanded)
}
