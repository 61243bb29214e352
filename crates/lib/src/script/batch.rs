//! Windows batch dialect.
//!
//! Scripts run with delayed expansion and refer to the root as `!ROOT!`, so
//! a root directory containing parentheses or `%` cannot break a block.
//! Literal path text is escaped twice over: once for the parser and once
//! for delayed expansion.

use crate::platform::TargetOs;
use crate::settings::LinkMode;
use crate::snapshot::{Operation, OperationKind};
use crate::vpath::VirtualPath;

use super::{ScriptDialect, ScriptWriter, describe, notice, relative_link_text, relative_native};

const OS: TargetOs = TargetOs::Windows;

pub(super) fn render(ops: &[Operation], mode: LinkMode) -> String {
  let mut w = ScriptWriter::new(ScriptDialect::Batch);
  w.line("@echo off");
  w.line(format!("rem {}", notice()));
  w.line("setlocal EnableExtensions EnableDelayedExpansion");
  w.line(r#"set "ROOT=%~dp0""#);
  w.line(r#"set "ROOT=!ROOT:~0,-1!""#);
  w.line("set /a SUCCESS=0");
  w.line("set /a FAILED=0");

  for op in ops {
    w.blank();
    w.line(format!("rem {}", describe(op).replace('%', "%%")));
    match (op.kind, &op.source) {
      (OperationKind::Delete, _) => delete(&mut w, op),
      (OperationKind::Create, Some(source)) => create(&mut w, op, source, mode),
      (OperationKind::Create, None) => {
        w.line(format!("echo Source not found: {}", echo_path(&op.target)));
        w.line("set /a FAILED+=1");
      }
    }
  }

  w.blank();
  w.line("echo Done: !SUCCESS! succeeded, !FAILED! failed");
  w.line("if !FAILED! GTR 0 exit /b 1");
  w.line("exit /b 0");
  w.finish()
}

pub(super) fn render_admin_relauncher() -> String {
  let mut w = ScriptWriter::new(ScriptDialect::Batch);
  w.line("@echo off");
  w.line(format!("rem {}", notice()));
  w.line("rem Runs the script named by the first argument with administrator rights.");
  w.line("setlocal");
  w.line(r#"if "%~1"=="" ("#);
  w.line("  echo Usage: %~nx0 script.bat");
  w.line("  exit /b 2");
  w.line(")");
  w.line("net session >nul 2>&1");
  w.line("if errorlevel 1 (");
  w.line(r#"  powershell -NoProfile -Command "Start-Process -FilePath '%~f0' -ArgumentList '%~1' -Verb RunAs""#);
  w.line("  exit /b 0");
  w.line(")");
  w.line(r#"call "%~dp0%~1""#);
  w.line("echo.");
  w.line("pause");
  w.finish()
}

fn delete(w: &mut ScriptWriter, op: &Operation) {
  let target = quoted_path(&op.target);
  w.line(format!("fsutil reparsepoint query {target} >nul 2>&1"));
  w.line("if not errorlevel 1 (");
  w.line(format!("  {} {target} >nul 2>&1", remove_command(op)));
  w.line(format!("  fsutil reparsepoint query {target} >nul 2>&1"));
  w.line("  if errorlevel 1 (");
  w.line("    set /a SUCCESS+=1");
  w.line("  ) else (");
  w.line(format!("    echo Symlink operation failed for {}", echo_path(&op.target)));
  w.line("    set /a FAILED+=1");
  w.line("  )");
  w.line(")");
}

fn create(w: &mut ScriptWriter, op: &Operation, source: &VirtualPath, mode: LinkMode) {
  let target = quoted_path(&op.target);
  let parent = op.target.parent();
  let parent_dir = quoted_dir(&parent);
  let source_path = quoted_path(source);
  let text = match mode {
    LinkMode::Absolute => source_path.clone(),
    LinkMode::Relative => format!("\"{}\"", escape_quoted(&relative_link_text(&op.target, source, OS))),
  };
  let mklink = if op.is_directory { "mklink /D" } else { "mklink" };

  w.line(format!("if not exist {source_path} ("));
  w.line(format!("  echo Source not found: {}", echo_path(source)));
  w.line("  set /a FAILED+=1");
  w.line(") else (");
  w.line(format!("  if not exist {parent_dir} mkdir {} >nul 2>&1", quoted_path(&parent)));
  w.line(format!("  if not exist {parent_dir} ("));
  w.line(format!("    echo Cannot create parent directory: {}", echo_path(&parent)));
  w.line("    set /a FAILED+=1");
  w.line("  ) else (");
  w.line(format!("    fsutil reparsepoint query {target} >nul 2>&1"));
  w.line(format!("    if not errorlevel 1 {} {target} >nul 2>&1", remove_command(op)));
  w.line(format!("    if exist {target} ("));
  w.line(format!("      echo Target blocked by existing file: {}", echo_path(&op.target)));
  w.line("      set /a FAILED+=1");
  w.line("    ) else (");
  w.line(format!("      {mklink} {target} {text} >nul 2>&1"));
  w.line("      if errorlevel 1 (");
  w.line(format!("        echo Symlink operation failed for {}", echo_path(&op.target)));
  w.line("        set /a FAILED+=1");
  w.line("      ) else (");
  w.line("        set /a SUCCESS+=1");
  w.line("      )");
  w.line("    )");
  w.line("  )");
  w.line(")");
}

/// Directory links are directories to `cmd`; file links are files.
fn remove_command(op: &Operation) -> &'static str {
  if op.is_directory { "rmdir" } else { "del /f /q" }
}

/// `"!ROOT!\<path>"`.
fn quoted_path(path: &VirtualPath) -> String {
  if path.is_root() {
    "\"!ROOT!\"".to_string()
  } else {
    format!("\"!ROOT!\\{}\"", escape_quoted(&relative_native(path, OS)))
  }
}

/// `"!ROOT!\<path>\"`; the trailing separator makes `exist` test for a directory.
fn quoted_dir(path: &VirtualPath) -> String {
  if path.is_root() {
    "\"!ROOT!\\\"".to_string()
  } else {
    format!("\"!ROOT!\\{}\\\"", escape_quoted(&relative_native(path, OS)))
  }
}

/// Unquoted path for an `echo` line.
fn echo_path(path: &VirtualPath) -> String {
  if path.is_root() {
    "!ROOT!".to_string()
  } else {
    format!("!ROOT!\\{}", escape_echo(&relative_native(path, OS)))
  }
}

/// Escape text inside double quotes on a line that uses delayed expansion.
fn escape_quoted(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '%' => out.push_str("%%"),
      '^' => out.push_str("^^"),
      '!' => out.push_str("^!"),
      other => out.push(other),
    }
  }
  out
}

/// Escape unquoted `echo` text on a line that uses delayed expansion.
fn escape_echo(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '%' => out.push_str("%%"),
      '^' => out.push_str("^^^^"),
      '!' => out.push_str("^^!"),
      '&' | '|' | '<' | '>' | '(' | ')' => {
        out.push('^');
        out.push(c);
      }
      other => out.push(other),
    }
  }
  out
}
