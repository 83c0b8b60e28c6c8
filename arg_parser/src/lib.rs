extern crate proc_macro;

use proc_macro::TokenStream;
use quote::{quote, format_ident};
use syn::{self, DeriveInput};

#[derive(deluxe::ExtractAttributes, Debug)]
#[deluxe(attributes(metadata))]
struct MetaDataDefinition {
    #[deluxe(default = String::from(""))]
    description: String,
}

#[derive(deluxe::ExtractAttributes, Debug)]
#[deluxe(attributes(pos))]
struct PosDefinition {
    #[deluxe(default = String::from(""))]
    name: String,

    #[deluxe(default = String::from(""))]
    description: String,

    #[deluxe(default = false)]
    required: bool,
}

struct PosData {
    field: String,
    display_name: String,
    description: Option<String>,
    required: bool,
}

impl PosData {
    fn from_pos_attribs(field: String, attrs: PosDefinition) -> PosData {
        PosData {
            display_name: match attrs.name.len() {
                0 => field.to_uppercase(),
                _ => attrs.name,
            },
            field,
            description: match attrs.description.len() {
                0 => None,
                _ => Some(attrs.description),
            },
            required: attrs.required,
        }
    }
}

// Operands are assigned in field declaration order, so a Vec rather than a map.
fn extract_pos_field_attrs(ast: &mut DeriveInput) -> deluxe::Result<Vec<PosData>> {
    let mut field_attrs: Vec<PosData> = Vec::new();

    if let syn::Data::Struct(s) = &mut ast.data {
        for field in s.fields.iter_mut() {
            let field_name = field.ident.as_ref().unwrap().to_string();
            let attrs: PosDefinition = deluxe::extract_attributes(field)?;
            field_attrs.push(PosData::from_pos_attribs(field_name, attrs));
        }
    } else {
        panic!("Only structs are supported");
    }

    Ok(field_attrs)
}

fn build_assignment(pos: &PosData) -> proc_macro2::TokenStream {
    let field = format_ident!("{}", pos.field);
    let display_name = syn::LitStr::new(&pos.display_name, proc_macro2::Span::call_site());
    let required = pos.required;

    quote! {
        match operands.next() {
            Some(value) => {
                return_struct.#field = value;
            }
            None => {
                if #required {
                    error(&format!("[ERROR] missing required argument <{}>", #display_name));
                }
            }
        }
    }
}

fn parse_cmd_args_derive2(item: proc_macro2::TokenStream) -> deluxe::Result<proc_macro2::TokenStream> {
    // parse
    let mut ast: DeriveInput = syn::parse2(item)?;
    let meta_data: MetaDataDefinition = deluxe::extract_attributes(&mut ast)?;

    // extract field attributes
    let positionals: Vec<PosData> = extract_pos_field_attrs(&mut ast)?;

    // Build the usage and argument-listing strings
    let mut usage_str = String::from("Usage: EXEC_NAME");
    let mut arguments_str = String::from("");

    for pos in &positionals {
        if pos.required {
            usage_str += &format!(" <{}>", pos.display_name);
        } else {
            usage_str += &format!(" [{}]", pos.display_name);
        }

        let description = pos.description.as_deref().unwrap_or("");
        arguments_str += &format!("   {:20} {}", pos.display_name, description);
        if pos.required {
            arguments_str += " (Required)";
        }
        arguments_str += "\n";
    }
    arguments_str += &format!("   {:20} {}", "-h, --help", "Displays help");

    if meta_data.description.len() > 0 {
        usage_str += &format!("\n\n{}", &meta_data.description);
    }

    let max_operands = positionals.len();

    let ident = &ast.ident;
    let (impl_generics, type_generics, where_clause) = ast.generics.split_for_impl();

    // Generate
    let assignments = positionals.iter().map(build_assignment);

    let code = quote! {
        impl #impl_generics #ident #type_generics #where_clause {
            pub fn parse() -> #ident {
                fn error(msg: &str) {
                    println!("{}", msg);
                    print_help();
                }

                fn print_help() {
                    let mut usage_str = String::from(#usage_str);
                    usage_str = usage_str
                        .replace(
                            "EXEC_NAME",
                            std::env::current_exe()
                                .ok()
                                .unwrap()
                                .file_name()
                                .unwrap()
                                .to_str()
                                .unwrap()
                        );
                    println!("{}", usage_str);
                    println!("\nArguments:");
                    println!("{}", #arguments_str);
                    std::process::exit(1);
                }

                let mut return_struct: #ident = Default::default();
                let mut args: Vec<String> = std::env::args().collect();

                args.remove(0);
                let mut operand_values: Vec<String> = Vec::new();
                for arg in args {
                    if arg == "-h" || arg == "--help" {
                        print_help();
                    } else if arg.starts_with('-') {
                        error(&format!("[ERROR] '{}' is not a valid option", arg));
                    } else {
                        operand_values.push(arg);
                    }
                }

                if operand_values.len() > #max_operands {
                    error(&format!(
                        "[ERROR] expected at most {} argument(s), got {}",
                        #max_operands,
                        operand_values.len()
                    ));
                }

                let mut operands = operand_values.into_iter();
                #(#assignments)*

                return_struct
            }
        }
    };

    Ok(code)
}

#[proc_macro_derive(CmdArgs, attributes(metadata, pos))]
pub fn parse_cmd_args_derive(input: TokenStream) -> TokenStream {
    parse_cmd_args_derive2(input.into()).unwrap().into()
}
