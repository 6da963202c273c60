use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    Data, DeriveInput, Fields, Ident, LitChar, LitStr, Path, Result, Type, parse_macro_input,
};

/// Derive `flagtree::Flags` for a struct with named fields.
///
/// ```ignore
/// #[derive(Default, flagtree::Flags)]
/// struct Opt {
///     #[flag(short = 'v', help = "Verbose output")]
///     verbose: bool,
///     #[flag(long = "max-conn", default = "100")]
///     max_conn: u32,
///     #[flag(short = 'o', meta = "FILE", complete = complete_paths)]
///     output: String,
///     #[flag(skip)]
///     cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Flags, attributes(flag))]
pub fn derive_flags(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_flags(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct FieldSpec {
    ident: Ident,
    ty: Type,
    short: Option<char>,
    long: Option<String>,
    default_value: Option<String>,
    help: Option<String>,
    meta: Option<String>,
    complete: Option<Path>,
}

impl FieldSpec {
    /// Lookup key used to read the parsed value back. The prefix pins the
    /// name table, so a short-only field never reads a long flag.
    fn key(&self) -> Option<String> {
        match (&self.long, self.short) {
            (Some(long), _) => Some(format!("--{long}")),
            (None, Some(short)) => Some(format!("-{short}")),
            (None, None) => None,
        }
    }
}

fn expand_flags(input: DeriveInput) -> Result<proc_macro2::TokenStream> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            "Flags can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new(
            input.ident.span(),
            "Flags requires a struct with named fields",
        ));
    };

    let mut specs = Vec::new();
    for field in &named.named {
        if let Some(spec) = field_spec(field)? {
            specs.push(spec);
        }
    }

    let registrations = specs.iter().map(register_expr);
    let loads = specs.iter().filter_map(load_stmt);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::flagtree::Flags for #name #ty_generics #where_clause {
            fn register(&self, set: &mut ::flagtree::FlagSet) -> ::flagtree::Result<()> {
                #(#registrations)*
                Ok(())
            }

            #[allow(unused_variables)]
            fn load(&mut self, set: &::flagtree::FlagSet) {
                #(#loads)*
            }
        }
    })
}

fn field_spec(field: &syn::Field) -> Result<Option<FieldSpec>> {
    let Some(ident) = field.ident.clone() else {
        return Err(syn::Error::new(Span::call_site(), "unnamed field"));
    };

    let mut skip = false;
    let mut short = None;
    let mut long = None;
    let mut default_value = None;
    let mut help = None;
    let mut meta_var = None;
    let mut complete = None;

    for attr in &field.attrs {
        if !attr.path().is_ident("flag") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
            } else if meta.path.is_ident("short") {
                let lit: LitChar = meta.value()?.parse()?;
                short = Some(lit.value());
            } else if meta.path.is_ident("long") {
                let lit: LitStr = meta.value()?.parse()?;
                long = Some(lit.value());
            } else if meta.path.is_ident("default") {
                let lit: LitStr = meta.value()?.parse()?;
                default_value = Some(lit.value());
            } else if meta.path.is_ident("help") {
                let lit: LitStr = meta.value()?.parse()?;
                help = Some(lit.value());
            } else if meta.path.is_ident("meta") {
                let lit: LitStr = meta.value()?.parse()?;
                meta_var = Some(lit.value());
            } else if meta.path.is_ident("complete") {
                complete = Some(meta.value()?.parse::<Path>()?);
            } else {
                return Err(meta.error("unsupported flag attribute"));
            }
            Ok(())
        })?;
    }

    if skip {
        return Ok(None);
    }

    // `long = ""` opts out of a long name.
    let long = match long {
        Some(long) => Some(long.trim_start_matches('-').to_string()).filter(|l| !l.is_empty()),
        None => Some(kebab_case(&ident)),
    };

    Ok(Some(FieldSpec {
        ident,
        ty: field.ty.clone(),
        short,
        long,
        default_value,
        help,
        meta: meta_var,
        complete,
    }))
}

fn kebab_case(ident: &Ident) -> String {
    let name = ident.to_string();
    name.trim_start_matches("r#").replace('_', "-")
}

fn register_expr(spec: &FieldSpec) -> proc_macro2::TokenStream {
    let ident = &spec.ident;
    let short = spec.short.map(|c| quote! { .short(#c) });
    let long = spec.long.as_deref().map(|l| quote! { .long(#l) });
    let default_value = spec
        .default_value
        .as_deref()
        .map(|d| quote! { .default_value(#d) });
    let help = spec.help.as_deref().map(|h| quote! { .help(#h) });
    let meta = spec.meta.as_deref().map(|m| quote! { .meta(#m) });
    let complete = spec.complete.as_ref().map(|p| quote! { .completer(#p) });

    quote! {
        set.register(
            ::flagtree::Flag::new(::flagtree::FlagField::to_value(&self.#ident))
                #short
                #long
                #default_value
                #help
                #meta
                #complete
        )?;
    }
}

fn load_stmt(spec: &FieldSpec) -> Option<proc_macro2::TokenStream> {
    let ident = &spec.ident;
    let ty = &spec.ty;
    let key = spec.key()?;
    Some(quote! {
        if let Some(value) = set.value_of::<#ty>(#key) {
            self.#ident = value;
        }
    })
}
