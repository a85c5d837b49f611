//! Make-style backend. Unlike Ninja, Make has no native `$in`/`$out`
//! auto-variables that line up with Fabrique's sentinel placeholders, so
//! `${in}`/`${out}` are expanded textually to the build's real,
//! space-joined input/output paths — exactly as the DAG recorded them,
//! per the shared substitution contract both backends honor.

use std::io::Write;

use super::{target_file_names, Backend, Formatter};
use crate::dag::{Build, Dag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MakeFlavour {
    Posix,
    Bsd,
    Gnu,
}

pub struct MakeBackend {
    pub flavour: MakeFlavour,
}

impl MakeBackend {
    fn expand(command: &str, build: &Build) -> String {
        let inputs = build.inputs.iter().map(|file| file.name.as_str()).collect::<Vec<_>>().join(" ");
        let outputs = build.outputs.iter().map(|file| file.name.as_str()).collect::<Vec<_>>().join(" ");
        command.replace("${in}", &inputs).replace("${out}", &outputs)
    }

    fn directories(dag: &Dag) -> Vec<String> {
        let mut dirs: Vec<String> = dag
            .builds
            .iter()
            .flat_map(|build| build.outputs.iter())
            .filter_map(|file| {
                let path = std::path::Path::new(&file.name);
                path.parent().filter(|p| !p.as_os_str().is_empty()).map(|p| p.to_string_lossy().to_string())
            })
            .collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }
}

impl Backend for MakeBackend {
    fn default_output_name(&self) -> &'static str {
        match self.flavour {
            MakeFlavour::Posix => "Makefile",
            MakeFlavour::Bsd => "BSDMakefile",
            MakeFlavour::Gnu => "GNUMakefile",
        }
    }

    fn write(&self, dag: &Dag, sink: &mut dyn Write) -> std::io::Result<()> {
        for (name, value) in &dag.variables {
            writeln!(sink, "{} := {}", name.to_uppercase(), Formatter::format(value))?;
        }
        if !dag.variables.is_empty() {
            writeln!(sink)?;
        }

        let directories = Self::directories(dag);
        for dir in &directories {
            writeln!(sink, "{dir}:\n\tmkdir -p {dir}\n")?;
        }

        let mut all_outputs = Vec::new();

        for build in &dag.builds {
            let primary = match build.outputs.first() {
                Some(file) => file,
                None => continue,
            };
            all_outputs.extend(build.outputs.iter().map(|file| file.name.clone()));

            let inputs = build.inputs.iter().map(|file| file.name.as_str()).collect::<Vec<_>>().join(" ");
            let order_only_dirs = build
                .outputs
                .iter()
                .filter_map(|file| std::path::Path::new(&file.name).parent())
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_string_lossy().to_string())
                .collect::<Vec<_>>();

            write!(sink, "{}: {inputs}", primary.name)?;
            if !order_only_dirs.is_empty() {
                write!(sink, " | {}", order_only_dirs.join(" "))?;
            }
            writeln!(sink)?;
            writeln!(sink, "\t@echo \"{}\"", build.rule.name)?;
            writeln!(sink, "\t{}", Self::expand(&build.rule.command, build))?;
            writeln!(sink)?;

            // Make has no clean way to attach one recipe to several output
            // files; the secondary outputs are declared dependent on the
            // primary one so `make secondary` still triggers the recipe.
            for extra in build.outputs.iter().skip(1) {
                writeln!(sink, "{}: {}\n", extra.name, primary.name)?;
            }

            if build.outputs.len() > 1 {
                writeln!(sink, ".PHONY: {}", build.name)?;
                writeln!(sink, "{}: {}\n", build.name, build.outputs.iter().map(|file| file.name.as_str()).collect::<Vec<_>>().join(" "))?;
            }
        }

        for target in dag.targets.values() {
            let files = target_file_names(&target.value);
            writeln!(sink, ".PHONY: {}", target.name)?;
            writeln!(sink, "{}: {}\n", target.name, files.join(" "))?;
        }

        writeln!(sink, ".PHONY: clean")?;
        writeln!(sink, "clean:")?;
        writeln!(sink, "\trm -f {}", all_outputs.join(" "))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::dag::{FileNode, Rule};
    use crate::types::FileTag;

    #[test]
    fn expands_sentinels_to_real_paths_and_default_filenames() {
        assert_eq!(MakeBackend { flavour: MakeFlavour::Posix }.default_output_name(), "Makefile");
        assert_eq!(MakeBackend { flavour: MakeFlavour::Gnu }.default_output_name(), "GNUMakefile");

        let rule = std::rc::Rc::new(Rule { name: "cc".to_string(), command: "cc -c ${in} -o ${out}".to_string() });
        let build = Build {
            name: "o".to_string(),
            rule,
            inputs: vec![std::rc::Rc::new(FileNode { name: "a.c".to_string(), tag: FileTag::In })],
            outputs: vec![std::rc::Rc::new(FileNode { name: "out/a.o".to_string(), tag: FileTag::Out })],
            extra_deps: vec![],
            extra_outputs: vec![],
            arguments: IndexMap::new(),
        };
        assert_eq!(MakeBackend::expand(&build.rule.command, &build), "cc -c a.c -o out/a.o");
    }
}
