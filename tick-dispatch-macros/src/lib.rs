//! Procedural macros for tick-dispatch

use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(ActionState)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(struct_named))]
struct ActionStateOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<(), CoreField>,

    /// Display name exposed as `ACTION_NAME` (defaults to the type name)
    #[darling(default)]
    name: Option<String>,
}

/// Field-level attributes
#[derive(Debug, FromField)]
#[darling(attributes(action))]
struct CoreField {
    ident: Option<syn::Ident>,

    /// Marks the embedded `ActionCore` field
    #[darling(default)]
    core: bool,
}

/// Derive macro for the ActionState trait
///
/// Implements `core()` / `core_mut()` by delegating to the embedded
/// `ActionCore`. The field is the one marked `#[action(core)]`, or else the
/// field named `core`. Also adds an `ACTION_NAME` constant for building the
/// core.
///
/// # Example
/// ```ignore
/// use tick_dispatch::{Action, ActionCore, ActionState};
///
/// #[derive(ActionState)]
/// #[action(name = "FadeIn")]
/// struct Fade {
///     #[action(core)]
///     state: ActionCore,
///     alpha: f32,
/// }
///
/// impl Fade {
///     fn new() -> Self {
///         Self { state: ActionCore::new(Self::ACTION_NAME), alpha: 0.0 }
///     }
/// }
///
/// impl Action for Fade {
///     fn on_start(&mut self) {
///         self.set_duration(0.5);
///     }
///     fn on_update(&mut self, dt: f32) {
///         self.alpha = (self.alpha + dt * 2.0).min(1.0);
///     }
/// }
/// ```
#[proc_macro_derive(ActionState, attributes(action))]
pub fn derive_action_state(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionStateOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let action_name = opts.name.clone().unwrap_or_else(|| name.to_string());

    let fields = match &opts.data {
        darling::ast::Data::Struct(fields) => &fields.fields,
        _ => {
            return syn::Error::new_spanned(&input, "ActionState can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let marked: Vec<_> = fields.iter().filter(|f| f.core).collect();
    let core_field = match marked.as_slice() {
        [field] => field.ident.clone(),
        [] => fields
            .iter()
            .filter_map(|f| f.ident.clone())
            .find(|ident| ident == "core"),
        _ => {
            return syn::Error::new_spanned(
                &input,
                "only one field may be marked #[action(core)]",
            )
            .to_compile_error()
            .into();
        }
    };

    let Some(core_field) = core_field else {
        return syn::Error::new_spanned(
            &input,
            "ActionState needs a field named `core` or one marked #[action(core)]",
        )
        .to_compile_error()
        .into();
    };

    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Default display name for this action kind
            pub const ACTION_NAME: &'static str = #action_name;
        }

        impl #impl_generics tick_dispatch::ActionState for #name #ty_generics #where_clause {
            fn core(&self) -> &tick_dispatch::ActionCore {
                &self.#core_field
            }

            fn core_mut(&mut self) -> &mut tick_dispatch::ActionCore {
                &mut self.#core_field
            }
        }
    };

    TokenStream::from(expanded)
}
