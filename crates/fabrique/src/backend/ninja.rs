//! Ninja-style backend: one block per variable, rule, and build, plus a
//! phony target per named DAG `Target`.
//!
//! A rule's command text already has every constant argument inlined by
//! the evaluator (see [`crate::eval::call_action`]); the only placeholders
//! left in [`crate::dag::Rule::command`] are the `${in}`/`${out}` sentinels,
//! which this backend rewrites to ninja's own `$in`/`$out` built-ins rather
//! than expanding them itself.

use std::io::Write;

use super::{target_file_names, Backend, Formatter};
use crate::dag::Dag;

pub struct NinjaBackend;

impl NinjaBackend {
    fn ninja_command(command: &str) -> String {
        command.replace("${in}", "$in").replace("${out}", "$out")
    }
}

impl Backend for NinjaBackend {
    fn default_output_name(&self) -> &'static str {
        "build.ninja"
    }

    fn write(&self, dag: &Dag, sink: &mut dyn Write) -> std::io::Result<()> {
        for (name, value) in &dag.variables {
            writeln!(sink, "{name} = {}", Formatter::format(value))?;
        }
        if !dag.variables.is_empty() {
            writeln!(sink)?;
        }

        for rule in &dag.rules {
            writeln!(sink, "rule {}", rule.name)?;
            writeln!(sink, "  command = {}", Self::ninja_command(&rule.command))?;
            writeln!(sink, "  description = {}", rule.name)?;
            writeln!(sink)?;
        }

        for build in &dag.builds {
            let outputs = build.outputs.iter().map(|file| file.name.as_str()).collect::<Vec<_>>().join(" ");
            let mut line = format!("build {outputs}");
            if !build.extra_outputs.is_empty() {
                let extra = build.extra_outputs.iter().map(|file| file.name.as_str()).collect::<Vec<_>>().join(" ");
                line.push_str(&format!(" | {extra}"));
            }
            line.push_str(&format!(": {}", build.rule.name));
            let inputs = build.inputs.iter().map(|file| file.name.as_str()).collect::<Vec<_>>().join(" ");
            if !inputs.is_empty() {
                line.push(' ');
                line.push_str(&inputs);
            }
            if !build.extra_deps.is_empty() {
                let deps = build.extra_deps.iter().map(|file| file.name.as_str()).collect::<Vec<_>>().join(" ");
                line.push_str(&format!(" || {deps}"));
            }
            writeln!(sink, "{line}")?;
        }
        if !dag.builds.is_empty() {
            writeln!(sink)?;
        }

        for target in dag.targets.values() {
            let files = target_file_names(&target.value);
            writeln!(sink, "build {}: phony {}", target.name, files.join(" "))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::dag::{Build, FileNode, Rule};
    use crate::types::FileTag;

    fn sample_dag() -> Dag {
        let rule = std::rc::Rc::new(Rule { name: "cc".to_string(), command: "cc -c ${in} -o ${out}".to_string() });
        let input = std::rc::Rc::new(FileNode { name: "a.c".to_string(), tag: FileTag::In });
        let output = std::rc::Rc::new(FileNode { name: "a.o".to_string(), tag: FileTag::Out });
        let build = std::rc::Rc::new(Build {
            name: "o".to_string(),
            rule: rule.clone(),
            inputs: vec![input],
            outputs: vec![output],
            extra_deps: vec![],
            extra_outputs: vec![],
            arguments: IndexMap::new(),
        });
        Dag { files: IndexMap::new(), rules: vec![rule], builds: vec![build], targets: IndexMap::new(), variables: IndexMap::new() }
    }

    #[test]
    fn rewrites_sentinels_to_ninja_builtins() {
        let dag = sample_dag();
        let mut buf = Vec::new();
        NinjaBackend.write(&dag, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("command = cc -c $in -o $out"));
        assert!(text.contains("build a.o: cc a.c"));
    }
}
