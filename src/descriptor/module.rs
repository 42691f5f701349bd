//! `MODULE`: a shared object loaded at run time.

use super::general::GeneralDesc;
use super::link::{GoLinkMode, LinkDesc};
use crate::error::Result;
use crate::ops::GlobalOps;

impl LinkDesc {
    pub(super) fn finalize_module(&mut self, g: &mut GeneralDesc, ops: &mut GlobalOps) -> Result<()> {
        self.finalize_cc(g, ops);

        let mut objs = self.suffixed_objs(".pic_o", |_| true);
        objs.extend(self.finalize_go_srcs(g, ops, GoLinkMode::Pic)?);
        objs.extend(ops.libs.our_pic(&self.libs));

        let ldlibs = ops.libs.external(&self.libs).join(" ");
        let rule = ops.libs.linker(&self.link, &self.libs);
        let name = format!("{}.so", g.target_name);
        let destdir = g.destdir.clone();
        let options = g.target_options.clone();
        g.add_target(&name, &rule, objs, &destdir, "")?
            .with_args([
                "ldflags=-rdynamic -fPIC -shared".to_owned(),
                format!("ldlibs={ldlibs}"),
            ])
            .with_options(options);

        self.finalize_analyse(g, ops)
    }
}
