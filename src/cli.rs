// src/cli.rs

use clap::{CommandFactory, Parser};

/// argfan: fans a command template out over lists of arguments.
///
/// Usage:
///   argfan [/flags] [/specifiers] <target> [template arguments...]
///
/// Every run executes <target> followed by the template, with each list's
/// current element substituted. Launcher flags start with `/` or `--`.
///
/// Specifiers (`<kind>apply[+[modifier]...][-argument]`):
///   capply            clipboard lines
///   fapply-PATH       file lines
///   gapply-ARGS       output of a nested argfan run
///   happly-URL        lines fetched over HTTP
///   iapply-A,B,C      inline comma-separated values
///   papply            piped standard input
///   pyapply-PATH[,A]  output of a script hook (`PATH get [A]`)
///   rapply-[START,]STOP[,STEP]   integer range, end exclusive
///   dapply-N / N      copy of list N;  dmapply-N  copy with its modifiers
///
/// Modifiers:
///   e  f:FMT  fi:FMT  ff:FMT  fl:SEP  fl|t (transpose)  g:ARGS  i:N
///   py:PATH[,A]  rep:X[:Y]  rm:RGX  rsN:RGX  rmsN:RGX  s:SLICES  s-:SLICES
///   sp:RGX  ss:SLICE  st|stl|str[:CHARS]  w:GLOB  w-:GLOB  xtrN:RGX
///
/// Markers inside template arguments: `%%%%` (next list), `%%N%%` (list N),
/// `%%SPECIFIER%%` (declare in place). `$$` works as an alternate delimiter
/// and a leading `\` keeps a marker literal.
///
/// Flags:
///   /quiet /qquiet /qqquiet  /yes  /echo  /dry  /list  /cd[-PATH]  /shell
///   /unsafe  /parallel  /limit-N  /noinline  /repeat-N  /rollover[+|-]
///   /crossjoin  /config-PATH  /help
#[derive(Parser, Debug)]
#[command(author, version, verbatim_doc_comment)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Launcher flags, specifiers, the target and its template arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Prints the usage text.
pub fn print_help() -> std::io::Result<()> {
    Cli::command().print_long_help()
}
