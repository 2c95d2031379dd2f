//! Filesystem and OS built-ins, plus the intrinsic methods on `File`
//! values. The failure-tolerant ones (`chmod`, `mkdir`, `unlink`)
//! return `false` instead of an error value.

use super::{arity_error, runtime_error};
use crate::environment::Environment;
use crate::values::{BuiltinFn, FileBacking, FileHandle, HashPair, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{BufRead, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::rc::Rc;
use std::time::UNIX_EPOCH;

pub(super) fn register(table: &mut HashMap<String, BuiltinFn>) {
    table.insert("chmod".into(), builtin_chmod);
    table.insert("directory.glob".into(), builtin_directory_glob);
    table.insert("mkdir".into(), builtin_mkdir);
    table.insert("open".into(), builtin_open);
    table.insert("os.environment".into(), builtin_os_environment);
    table.insert("os.getenv".into(), builtin_os_getenv);
    table.insert("os.setenv".into(), builtin_os_setenv);
    table.insert("stat".into(), builtin_stat);
    table.insert("unlink".into(), builtin_unlink);
}

/// `chmod(path, "0755")`; the mode is a string to emphasise octal.
fn builtin_chmod(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return arity_error(args.len(), "2");
    }
    let path = args[0].inspect();
    let Value::String(mode) = &args[1] else {
        return runtime_error(format!(
            "second argument to `chmod` must be string, got={}",
            args[1].type_name()
        ));
    };
    let Ok(bits) = u32::from_str_radix(mode, 8) else {
        return Value::Bool(false);
    };
    Value::Bool(fs::set_permissions(&path, fs::Permissions::from_mode(bits)).is_ok())
}

fn builtin_mkdir(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    let Value::String(path) = &args[0] else {
        return runtime_error(format!(
            "argument to `mkdir` must be string, got={}",
            args[0].type_name()
        ));
    };
    Value::Bool(fs::create_dir_all(path).is_ok())
}

fn builtin_unlink(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    let path = args[0].inspect();
    Value::Bool(fs::remove_file(&path).is_ok() || fs::remove_dir(&path).is_ok())
}

/// `stat(path)` → `{size, mtime, perm, mode, type}`, or an empty hash
/// when the path does not exist.
fn builtin_stat(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    let path = args[0].inspect();
    let mut pairs = BTreeMap::new();
    let Ok(meta) = fs::metadata(&path) else {
        return Value::new_hash(pairs);
    };

    let mut put = |name: &str, value: Value| {
        let key = Value::String(name.to_string());
        if let Some(hash_key) = key.hash_key() {
            pairs.insert(hash_key, HashPair { key, value });
        }
    };

    put("size", Value::Int(meta.len() as i64));
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    put("mtime", Value::Int(mtime));
    let mode = format!("{:04o}", meta.permissions().mode() & 0o7777);
    put("perm", Value::String(mode.clone()));
    put("mode", Value::String(mode));
    let kind = if meta.is_dir() {
        "directory"
    } else if meta.is_file() {
        "file"
    } else {
        "unknown"
    };
    put("type", Value::String(kind.to_string()));

    Value::new_hash(pairs)
}

/// `open(path)` / `open(path, mode)` with modes `r`, `w` and `a`.
fn builtin_open(_env: &Environment, args: Vec<Value>) -> Value {
    if args.is_empty() {
        return arity_error(args.len(), "1+");
    }
    let Value::String(path) = &args[0] else {
        return runtime_error(format!(
            "argument to `open` must be string, got={}",
            args[0].type_name()
        ));
    };
    let mode = match args.get(1) {
        None => "r".to_string(),
        Some(Value::String(mode)) => mode.clone(),
        Some(other) => {
            return runtime_error(format!(
                "mode argument to `open` must be string, got={}",
                other.type_name()
            ))
        }
    };

    let backing = match mode.as_str() {
        "r" => fs::File::open(path).map(|f| FileBacking::Read(std::io::BufReader::new(f))),
        "w" => fs::File::create(path).map(FileBacking::Write),
        "a" => fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map(FileBacking::Write),
        other => return runtime_error(format!("unknown open mode: {}", other)),
    };
    match backing {
        Ok(backing) => Value::File(Rc::new(RefCell::new(FileHandle {
            path: path.clone(),
            mode,
            backing: Some(backing),
        }))),
        Err(err) => runtime_error(format!("failed to open {}: {}", path, err)),
    }
}

fn builtin_directory_glob(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    let Value::String(pattern) = &args[0] else {
        return runtime_error(format!(
            "argument to `directory.glob` must be string, got={}",
            args[0].type_name()
        ));
    };
    let Ok(entries) = glob::glob(pattern) else {
        return Value::Null;
    };
    let matches: Vec<Value> = entries
        .flatten()
        .map(|path| Value::String(path.to_string_lossy().into_owned()))
        .collect();
    Value::new_array(matches)
}

fn builtin_os_getenv(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    let Value::String(name) = &args[0] else {
        return runtime_error(format!(
            "argument must be a string, got={}",
            args[0].type_name()
        ));
    };
    Value::String(std::env::var(name).unwrap_or_default())
}

fn builtin_os_setenv(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return arity_error(args.len(), "2");
    }
    let (Value::String(name), Value::String(value)) = (&args[0], &args[1]) else {
        return runtime_error(format!(
            "arguments must be string, got={} and {}",
            args[0].type_name(),
            args[1].type_name()
        ));
    };
    std::env::set_var(name, value);
    Value::Null
}

fn builtin_os_environment(_env: &Environment, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return arity_error(args.len(), "0");
    }
    let mut pairs = BTreeMap::new();
    for (name, value) in std::env::vars() {
        let key = Value::String(name);
        if let Some(hash_key) = key.hash_key() {
            pairs.insert(
                hash_key,
                HashPair {
                    key,
                    value: Value::String(value),
                },
            );
        }
    }
    Value::new_hash(pairs)
}

// ── Intrinsic methods on File values ──

pub(crate) fn file_read(handle: &Rc<RefCell<FileHandle>>) -> Value {
    let mut state = handle.borrow_mut();
    match &mut state.backing {
        Some(FileBacking::Read(reader)) => {
            let mut out = String::new();
            match reader.read_to_string(&mut out) {
                Ok(_) => Value::String(out),
                Err(err) => runtime_error(format!("failed to read: {}", err)),
            }
        }
        _ => runtime_error(format!("file {} is not open for reading", state.path)),
    }
}

pub(crate) fn file_readlines(handle: &Rc<RefCell<FileHandle>>) -> Value {
    let mut state = handle.borrow_mut();
    match &mut state.backing {
        Some(FileBacking::Read(reader)) => {
            let mut lines = Vec::new();
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        lines.push(Value::String(line.trim_end_matches('\n').to_string()));
                    }
                    Err(err) => return runtime_error(format!("failed to read: {}", err)),
                }
            }
            Value::new_array(lines)
        }
        _ => runtime_error(format!("file {} is not open for reading", state.path)),
    }
}

pub(crate) fn file_write(handle: &Rc<RefCell<FileHandle>>, text: &Value) -> Value {
    let mut state = handle.borrow_mut();
    let rendered = text.inspect();
    match &mut state.backing {
        Some(FileBacking::Write(file)) => Value::Bool(file.write_all(rendered.as_bytes()).is_ok()),
        _ => runtime_error(format!("file {} is not open for writing", state.path)),
    }
}

pub(crate) fn file_close(handle: &Rc<RefCell<FileHandle>>) -> Value {
    handle.borrow_mut().backing = None;
    Value::Null
}
