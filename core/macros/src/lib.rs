//! Derive macros for `ratjs_gc::{Trace, Finalize}`.
//!
//! Generated impls walk every field with `synstructure`, forwarding to that
//! field's own `Trace`/`Finalize` impl - the same shape `#[derive(Trace,
//! Finalize)]` takes throughout the teacher crate (every `Object`,
//! `Environment`, `Promise`, ... in `boa` derives these rather than hand-
//! writing the scan function described in spec §3.2).

use synstructure::{decl_derive, Structure};

decl_derive!([Trace] => derive_trace);
decl_derive!([Finalize] => derive_finalize);

fn derive_trace(mut s: Structure<'_>) -> proc_macro2::TokenStream {
    s.add_bounds(synstructure::AddBounds::Fields);
    s.bind_with(|_| synstructure::BindStyle::Ref);

    let trace_body = s.each(|bi| quote::quote!(ratjs_gc::Trace::trace(#bi, __stack)));
    let root_body = s.each(|bi| quote::quote!(ratjs_gc::Trace::root(#bi)));
    let unroot_body = s.each(|bi| quote::quote!(ratjs_gc::Trace::unroot(#bi)));

    s.gen_impl(quote::quote! {
        gen unsafe impl ratjs_gc::Trace for @Self {
            #[inline]
            unsafe fn trace(&self, __stack: &mut ratjs_gc::MarkStack) {
                match self { #trace_body }
            }

            #[inline]
            unsafe fn root(&self) {
                match self { #root_body }
            }

            #[inline]
            unsafe fn unroot(&self) {
                match self { #unroot_body }
            }
        }
    })
}

fn derive_finalize(mut s: Structure<'_>) -> proc_macro2::TokenStream {
    s.add_bounds(synstructure::AddBounds::Fields);
    s.gen_impl(quote::quote! {
        gen impl ratjs_gc::Finalize for @Self {}
    })
}
