use darling::{ast, FromDeriveInput, FromField, FromMeta};
use proc_macro2::TokenTree;
use quote::{format_ident, quote, ToTokens};
use syn::Meta;

#[derive(Default, FromMeta)]
struct ModelArgs {
	#[darling(default)]
	create: bool,
	#[darling(default)]
	update: bool,
}

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named))]
struct ModelInputReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelFieldReceiver>,
}

#[derive(Debug, FromField)]
#[darling(attributes(model), forward_attrs(doc, serde, validate, schemars))]
struct ModelFieldReceiver {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,

	#[darling(default)]
	read_only: bool,
}

impl ModelFieldReceiver {
	/// Whether the client is allowed to provide this field.
	fn is_writable(&self) -> bool {
		!self.read_only && !self.attrs.iter().any(is_serde_skip)
	}
}

/// Matches `#[serde(skip)]` and `#[serde(skip_deserializing)]`.
fn is_serde_skip(attr: &syn::Attribute) -> bool {
	let Meta::List(ref list) = attr.meta else {
		return false;
	};

	if !list.path.is_ident("serde") {
		return false;
	}

	list.tokens.to_token_stream().into_iter().any(|token| {
		matches!(token, TokenTree::Ident(ref ident) if ident == "skip_deserializing" || ident == "skip")
	})
}

fn is_option(ty: &syn::Type) -> bool {
	let syn::Type::Path(path) = ty else {
		return false;
	};

	path.qself.is_none()
		&& path
			.path
			.segments
			.last()
			.is_some_and(|segment| segment.ident == "Option")
}

pub fn from_input(
	args: proc_macro::TokenStream,
	input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
	let args = match ast::NestedMeta::parse_meta_list(args.into()) {
		Ok(x) => x,
		Err(e) => return e.into_compile_error().into(),
	};

	let mut args = match ModelArgs::from_list(&args) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	if !args.create && !args.update {
		args.create = true;
		args.update = true;
	}

	let mut input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelInputReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	// `#[model(..)]` is only meaningful to this macro, so it is stripped
	// from the struct that gets emitted.
	if let syn::Data::Struct(ref mut data) = input.data {
		for field in &mut data.fields {
			field.attrs.retain(|attr| !attr.path().is_ident("model"));
		}
	}

	let ident = &receiver.ident;
	let vis = &input.vis;
	let generics = &receiver.generics;

	let Some(fields) = receiver.data.take_struct() else {
		return syn::Error::new_spanned(ident, "#[model] only supports structs")
			.into_compile_error()
			.into();
	};

	let fields = fields
		.iter()
		.filter(|field| field.is_writable())
		.filter_map(|field| Some((&field.attrs, field.ident.as_ref()?, &field.ty, &field.vis)))
		.collect::<Vec<_>>();

	let create = args.create.then(|| {
		let create_ident = format_ident!("Create{}", ident);
		let doc = format!("The fields a client provides when creating a [`{ident}`].");
		let create_fields = fields.iter().map(|(attrs, ident, ty, vis)| {
			quote! {
				#(#attrs)*
				#vis #ident: #ty,
			}
		});

		quote! {
			#[doc = #doc]
			#[derive(Debug, ::serde::Deserialize, ::schemars::JsonSchema, ::validator::Validate)]
			#[serde(deny_unknown_fields)]
			#vis struct #create_ident #generics {
				#(
					#create_fields
				)*
			}
		}
	});

	let update = args.update.then(|| {
		let update_ident = format_ident!("Update{}", ident);
		let doc = format!(
			"The fields a client may change on an existing [`{ident}`]. Omitted fields are left untouched."
		);
		let update_fields = fields.iter().map(|(attrs, ident, ty, vis)| {
			let ty = if is_option(ty) {
				quote!(#ty)
			} else {
				quote!(Option<#ty>)
			};

			quote! {
				#(#attrs)*
				#vis #ident: #ty,
			}
		});

		quote! {
			#[doc = #doc]
			#[derive(Debug, ::serde::Deserialize, ::schemars::JsonSchema, ::validator::Validate)]
			#[serde(deny_unknown_fields)]
			#vis struct #update_ident #generics {
				#(
					#update_fields
				)*
			}
		}
	});

	quote! {
		#input

		#create

		#update
	}
	.into()
}
