//! Built-in directive templates.

use super::general::GeneralDesc;
use super::goprog::{GoDesc, GoMode};
use super::install::InstallDesc;
use super::library::LibDesc;
use super::link::LinkDesc;
use super::target::TargetOption::{All, Incdeps, Lib, Libdeps, Piclibdeps};
use super::{Descriptor, DescriptorKind};

/// Directive names with a built-in template.
pub const BUILTIN_NAMES: [&str; 10] = [
    "PROG",
    "TOOL_PROG",
    "LIB",
    "LINKERSET_LIB",
    "MODULE",
    "GOPROG",
    "GOTEST",
    "GOMODULE",
    "INSTALL",
    "TOOL_INSTALL",
];

fn library(link_set: bool) -> Descriptor {
    Descriptor::new(
        GeneralDesc::template("dest_lib", [Lib]),
        DescriptorKind::Lib(LibDesc {
            link: LinkDesc::template("", true),
            link_set,
        }),
    )
}

fn go(destdir: &str, mode: GoMode) -> Descriptor {
    let options = match mode {
        GoMode::Loadable => [All, Incdeps, Piclibdeps],
        GoMode::Program | GoMode::Test => [All, Incdeps, Libdeps],
    };
    Descriptor::new(GeneralDesc::template(destdir, options), DescriptorKind::Go(GoDesc::template(mode)))
}

/// Template registered under `name`, if any.
///
/// # Examples
///
/// ```
/// use builddesc::descriptor::templates;
/// assert!(templates::builtin("PROG").is_some());
/// assert!(templates::builtin("prog").is_none());
/// ```
#[must_use]
pub fn builtin(name: &str) -> Option<Descriptor> {
    let desc = match name {
        "PROG" => Descriptor::new(
            GeneralDesc::template("dest_bin", [All]),
            DescriptorKind::Prog(LinkDesc::template("link", false)),
        ),
        "TOOL_PROG" => Descriptor::new(
            GeneralDesc::template("dest_tool", []),
            DescriptorKind::Prog(LinkDesc::template("link", false)),
        ),
        "LIB" => library(false),
        "LINKERSET_LIB" => library(true),
        "MODULE" => Descriptor::new(
            GeneralDesc::template("dest_mod", [All]),
            DescriptorKind::Module(LinkDesc::template("link", true)),
        ),
        "GOPROG" => go("dest_bin", GoMode::Program),
        "GOTEST" => go("gotest", GoMode::Test),
        "GOMODULE" => go("dest_mod", GoMode::Loadable),
        "INSTALL" => Descriptor::new(GeneralDesc::default(), DescriptorKind::Install(InstallDesc::default())),
        "TOOL_INSTALL" => Descriptor::new(
            GeneralDesc::template("dest_tool", []),
            DescriptorKind::Install(InstallDesc::default()),
        ),
        _ => return None,
    };
    Some(desc)
}
