use std::path::Path;
use std::process;

use pluto_core::printer;

use super::{fail_with, read_or_exit};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_fmt(file: &Path, check: bool, output: OutputFormat, quiet: bool) {
    let text = read_or_exit(file, output, quiet);
    let ast = match pluto_core::parse_source(&text) {
        Ok(ast) => ast,
        Err(d) => fail_with(file, &d, output, quiet),
    };
    let formatted = printer::print_source_file(&ast);

    if check {
        if formatted != text {
            report_error(
                &format!("{}: not in canonical form", file.display()),
                output,
                quiet,
            );
            process::exit(1);
        }
        return;
    }
    print!("{}", formatted);
}
