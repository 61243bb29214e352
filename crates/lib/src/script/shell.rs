//! POSIX shell dialect.

use crate::platform::TargetOs;
use crate::settings::LinkMode;
use crate::snapshot::{Operation, OperationKind};
use crate::vpath::VirtualPath;

use super::{ScriptDialect, ScriptWriter, describe, notice, relative_link_text, relative_native};

const OS: TargetOs = TargetOs::Unix;

pub(super) fn render(ops: &[Operation], mode: LinkMode) -> String {
  let mut w = ScriptWriter::new(ScriptDialect::Shell);
  w.line("#!/bin/sh");
  w.line(format!("# {}", notice()));
  w.line(r#"ROOT="$(cd "$(dirname "$0")" && pwd)""#);
  w.line("SUCCESS=0");
  w.line("FAILED=0");

  for op in ops {
    w.blank();
    w.line(format!("# {}", describe(op)));
    match (op.kind, &op.source) {
      (OperationKind::Delete, _) => delete(&mut w, op),
      (OperationKind::Create, Some(source)) => create(&mut w, op, source, mode),
      (OperationKind::Create, None) => {
        w.line(format!("echo \"Source not found: {}\"", rooted(&op.target)));
        w.line("FAILED=$((FAILED + 1))");
      }
    }
  }

  w.blank();
  w.line(r#"echo "Done: $SUCCESS succeeded, $FAILED failed""#);
  w.line(r#"[ "$FAILED" -eq 0 ] || exit 1"#);
  w.finish()
}

fn delete(w: &mut ScriptWriter, op: &Operation) {
  let target = rooted(&op.target);
  w.line(format!("if [ -L \"{target}\" ]; then"));
  w.line(format!("  if {} \"{target}\"; then", remove_command(op)));
  w.line("    SUCCESS=$((SUCCESS + 1))");
  w.line("  else");
  w.line(format!("    echo \"Symlink operation failed for {target}\""));
  w.line("    FAILED=$((FAILED + 1))");
  w.line("  fi");
  w.line("fi");
}

fn create(w: &mut ScriptWriter, op: &Operation, source: &VirtualPath, mode: LinkMode) {
  let target = rooted(&op.target);
  let parent = rooted(&op.target.parent());
  let source_path = rooted(source);
  let text = match mode {
    LinkMode::Absolute => source_path.clone(),
    LinkMode::Relative => escape(&relative_link_text(&op.target, source, OS)),
  };

  w.line(format!("if [ ! -e \"{source_path}\" ]; then"));
  w.line(format!("  echo \"Source not found: {source_path}\""));
  w.line("  FAILED=$((FAILED + 1))");
  w.line(format!("elif ! mkdir -p \"{parent}\"; then"));
  w.line(format!("  echo \"Cannot create parent directory: {parent}\""));
  w.line("  FAILED=$((FAILED + 1))");
  w.line("else");
  w.line(format!("  if [ -L \"{target}\" ]; then"));
  w.line(format!("    {} \"{target}\"", remove_command(op)));
  w.line("  fi");
  w.line(format!("  if [ -e \"{target}\" ]; then"));
  w.line(format!("    echo \"Target blocked by existing file: {target}\""));
  w.line("    FAILED=$((FAILED + 1))");
  w.line(format!("  elif ln -sf \"{text}\" \"{target}\"; then"));
  w.line("    SUCCESS=$((SUCCESS + 1))");
  w.line("  else");
  w.line(format!("    echo \"Symlink operation failed for {target}\""));
  w.line("    FAILED=$((FAILED + 1))");
  w.line("  fi");
  w.line("fi");
}

/// `rm` on a symlink never follows it, even for a directory link.
fn remove_command(op: &Operation) -> &'static str {
  if op.is_directory { "rm -rf" } else { "rm -f" }
}

/// `$ROOT/<path>` ready for use inside double quotes.
fn rooted(path: &VirtualPath) -> String {
  if path.is_root() {
    "$ROOT".to_string()
  } else {
    format!("$ROOT/{}", escape(&relative_native(path, OS)))
  }
}

/// Escape text for a double-quoted shell word.
fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '"' | '$' | '`' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}
