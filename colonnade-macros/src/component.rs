use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

/// Emit the `Component` marker impl for the annotated type.
///
/// The `Component` trait requires `bytemuck::Pod`, so the annotated type must
/// also derive (or manually implement) `Pod` and `Zeroable`; this derive only
/// supplies the marker impl itself.
pub(crate) fn derive_component(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        impl #impl_generics ::colonnade::component::Component for #name #ty_generics #where_clause {}
    }
    .into()
}
