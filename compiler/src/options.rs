use arg_parser::CmdArgs;

#[derive(CmdArgs, Debug, Default)]
#[metadata(description = "Compiles Jack classes into Hack VM code.")]
pub struct Options {
    #[pos(
        name = "SOURCE",
        description = "A .jack file, or a directory whose .jack files are compiled",
        required = true
    )]
    pub path: String,
}
