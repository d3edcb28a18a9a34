mod model;
mod route;

use proc_macro::TokenStream;

/// Generates an `aide` documentation function for a handler, named after the
/// handler with a `_docs` suffix.
///
/// The first line of the doc comment becomes the operation summary and the
/// remaining lines (if any) become its description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Generates the client-facing input structs of a model.
///
/// `#[model]` emits both `CreateX` and `UpdateX`; `#[model(create)]` or
/// `#[model(update)]` restricts the output to one of them.
///
/// Fields marked `#[model(read_only)]`, `#[serde(skip)]` or
/// `#[serde(skip_deserializing)]` are controlled by the server and left out of
/// both inputs. Inputs reject unknown fields, so a client cannot smuggle a
/// server-controlled field into a request. Fields of `UpdateX` are wrapped in
/// `Option` unless they already are one.
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(args, input)
}
