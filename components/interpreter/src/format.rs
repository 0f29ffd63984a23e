//! Printing values the way the language prints them.

use std::fmt::Write;

use core_types::{Poly, PolyKind};
use memory_manager::Heap;

use crate::builtin::BuiltinTable;

// Self-referencing lists print as `[...]` past this depth.
const MAX_DEPTH: usize = 16;

/// Render `p`. Strings print bare at top level and quoted inside lists.
pub fn format_poly(heap: &Heap, builtins: &BuiltinTable, p: Poly) -> String {
    let mut out = String::new();
    write_poly(&mut out, heap, builtins, p, 0);
    out
}

fn write_float(out: &mut String, f: f32) {
    let _ = if f.is_nan() {
        write!(out, "nan")
    } else if f.is_infinite() {
        write!(out, "{}", if f > 0.0 { "inf" } else { "-inf" })
    } else if f == f.trunc() && f.abs() < 1e16 {
        write!(out, "{}", f as i64)
    } else {
        write!(out, "{}", f)
    };
}

fn write_poly(out: &mut String, heap: &Heap, builtins: &BuiltinTable, p: Poly, depth: usize) {
    if p.is_null() {
        out.push_str("None");
        return;
    }
    if p.is_global() {
        out.push_str("<global>");
        return;
    }
    match p.kind() {
        PolyKind::Float => write_float(out, p.to_f32()),
        PolyKind::String => {
            let text = String::from_utf8_lossy(heap.string_bytes(p.offset()));
            if depth == 0 {
                out.push_str(&text);
            } else {
                let _ = write!(out, "'{}'", text);
            }
        }
        PolyKind::List => {
            if depth >= MAX_DEPTH {
                out.push_str("[...]");
                return;
            }
            out.push('[');
            for (i, item) in heap.list_items(p.offset()).into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_poly(out, heap, builtins, item, depth + 1);
            }
            out.push(']');
        }
        PolyKind::Func => out.push_str("<function>"),
        PolyKind::Builtin => match builtins.get(p) {
            Some(b) => {
                let _ = write!(out, "<builtin {}>", b.name);
            }
            None => out.push_str("<builtin>"),
        },
    }
}
