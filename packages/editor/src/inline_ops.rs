//! Char-offset edits over a leaf's inline run.
//!
//! Text and code runs are split at offsets. Links and anchors are entered
//! rather than split, so an anchor id never ends up on two pieces.

use std::collections::HashSet;

use inkpress_parser::ast::{normalize_inlines, Inline, Marks};

/// Byte index of the `chars`-th char
pub(crate) fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}

/// Split a text or code run. Other inlines never need splitting: they
/// are either containers or one char long.
fn split_leaf(inline: Inline, at: usize) -> (Inline, Inline) {
    match inline {
        Inline::Text { text, marks } => {
            let index = byte_offset(&text, at);
            (
                Inline::Text {
                    text: text[..index].to_string(),
                    marks: marks.clone(),
                },
                Inline::Text {
                    text: text[index..].to_string(),
                    marks,
                },
            )
        }
        Inline::Code { code } => {
            let index = byte_offset(&code, at);
            (
                Inline::Code {
                    code: code[..index].to_string(),
                },
                Inline::Code {
                    code: code[index..].to_string(),
                },
            )
        }
        other => (other, Inline::text("")),
    }
}

fn is_leaf_run(inline: &Inline) -> bool {
    matches!(inline, Inline::Text { .. } | Inline::Code { .. })
}

/// Replace every text or code piece inside `start..end` with `f(piece)`
pub fn map_leaves_in_range(
    inlines: &mut Vec<Inline>,
    start: usize,
    end: usize,
    f: &mut dyn FnMut(Inline) -> Inline,
) {
    let mut out = Vec::with_capacity(inlines.len());
    let mut pos = 0;

    for mut inline in inlines.drain(..) {
        let len = inline.char_len();
        let (s, e) = (start.max(pos), end.min(pos + len));

        if s >= e {
            out.push(inline);
        } else if is_leaf_run(&inline) {
            let (head, rest) = split_leaf(inline, s - pos);
            let (mid, tail) = split_leaf(rest, e - s);
            out.push(head);
            out.push(f(mid));
            out.push(tail);
        } else {
            if let Some(children) = inline.children_mut() {
                map_leaves_in_range(children, s - pos, e - pos, f);
            }
            out.push(inline);
        }

        pos += len;
    }

    normalize_inlines(&mut out);
    *inlines = out;
}

/// Whether every text run inside `start..end` satisfies `pred`. False when
/// the range holds no text at all.
pub fn range_all_text(
    inlines: &[Inline],
    start: usize,
    end: usize,
    pred: &dyn Fn(&Marks) -> bool,
) -> bool {
    fn walk(
        inlines: &[Inline],
        start: usize,
        end: usize,
        pred: &dyn Fn(&Marks) -> bool,
        seen: &mut bool,
    ) -> bool {
        let mut pos = 0;
        for inline in inlines {
            let len = inline.char_len();
            let (s, e) = (start.max(pos), end.min(pos + len));
            if s < e {
                match inline {
                    Inline::Text { marks, .. } => {
                        *seen = true;
                        if !pred(marks) {
                            return false;
                        }
                    }
                    Inline::Link { children, .. } | Inline::Anchor { children, .. } => {
                        if !walk(children, s - pos, e - pos, pred, seen) {
                            return false;
                        }
                    }
                    _ => {}
                }
            }
            pos += len;
        }
        true
    }

    let mut seen = false;
    walk(inlines, start, end, pred, &mut seen) && seen
}

/// Whether everything inside `start..end` is inline code
pub fn range_all_code(inlines: &[Inline], start: usize, end: usize) -> bool {
    let mut all = true;
    let mut any = false;
    let mut pos = 0;
    for inline in inlines {
        let len = inline.char_len();
        let (s, e) = (start.max(pos), end.min(pos + len));
        if s < e {
            match inline {
                Inline::Code { .. } => any = true,
                Inline::Link { children, .. } | Inline::Anchor { children, .. } => {
                    if range_all_code(children, s - pos, e - pos) {
                        any = true;
                    } else {
                        all = false;
                    }
                }
                _ => all = false,
            }
        }
        pos += len;
    }
    all && any
}

/// Delete `start..end`. Containers are entered; one that is fully covered
/// goes away with its content.
pub fn delete_range(inlines: &mut Vec<Inline>, start: usize, end: usize) {
    let mut out = Vec::with_capacity(inlines.len());
    let mut pos = 0;

    for mut inline in inlines.drain(..) {
        let len = inline.char_len();
        let (s, e) = (start.max(pos), end.min(pos + len));

        if s >= e {
            out.push(inline);
        } else if s == pos && e == pos + len {
            // covered
        } else if is_leaf_run(&inline) {
            let (head, rest) = split_leaf(inline, s - pos);
            let (_, tail) = split_leaf(rest, e - s);
            out.push(head);
            out.push(tail);
        } else {
            if let Some(children) = inline.children_mut() {
                delete_range(children, s - pos, e - pos);
            }
            out.push(inline);
        }

        pos += len;
    }

    normalize_inlines(&mut out);
    *inlines = out;
}

/// Copy of `start..end`
pub fn slice(inlines: &[Inline], start: usize, end: usize) -> Vec<Inline> {
    let total: usize = inlines.iter().map(Inline::char_len).sum();
    let mut out = inlines.to_vec();
    delete_range(&mut out, end.min(total), total);
    delete_range(&mut out, 0, start.min(end));
    out
}

/// Marks a char typed at `offset` inherits: those of the run ending at or
/// containing the offset, or of the first run at offset zero
pub fn marks_at(inlines: &[Inline], offset: usize) -> Marks {
    let mut pos = 0;
    for inline in inlines {
        let len = inline.char_len();
        if (offset > pos && offset <= pos + len) || (offset == 0 && pos == 0) {
            return match inline {
                Inline::Text { marks, .. } => marks.clone(),
                Inline::Link { children, .. } | Inline::Anchor { children, .. } => {
                    marks_at(children, offset - pos)
                }
                _ => Marks::default(),
            };
        }
        pos += len;
    }
    Marks::default()
}

/// Insert inlines at `offset`, inside a container when the offset falls
/// strictly within one
pub fn insert_inlines(inlines: &mut Vec<Inline>, offset: usize, new: Vec<Inline>) {
    let mut pos = 0;
    let mut index = inlines.len();

    for i in 0..inlines.len() {
        let len = inlines[i].char_len();
        if offset <= pos {
            index = i;
            break;
        }
        if offset < pos + len {
            if let Some(children) = inlines[i].children_mut() {
                insert_inlines(children, offset - pos, new);
                return;
            }
            // typing inside inline code stays code
            if let (Inline::Code { code }, [Inline::Text { text, .. }]) =
                (&mut inlines[i], new.as_slice())
            {
                let at = byte_offset(code, offset - pos);
                code.insert_str(at, text);
                return;
            }
            let (head, tail) = split_leaf(inlines.remove(i), offset - pos);
            let pieces: Vec<Inline> = std::iter::once(head)
                .chain(new)
                .chain(std::iter::once(tail))
                .collect();
            inlines.splice(i..i, pieces);
            normalize_inlines(inlines);
            return;
        }
        pos += len;
    }

    inlines.splice(index..index, new);
    normalize_inlines(inlines);
}

/// Type `text` at `offset`. Newlines become line breaks; the text takes
/// the marks of the run to its left.
pub fn insert_text(inlines: &mut Vec<Inline>, offset: usize, text: &str) -> usize {
    let marks = marks_at(inlines, offset);
    let mut new = Vec::new();
    let mut inserted = 0;

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            new.push(Inline::LineBreak);
            inserted += 1;
        }
        if !line.is_empty() {
            inserted += line.chars().count();
            new.push(Inline::Text {
                text: line.to_string(),
                marks: marks.clone(),
            });
        }
    }

    if !new.is_empty() {
        insert_inlines(inlines, offset, new);
    }
    inserted
}

/// Wrap `start..end` in a new container. The range is first narrowed into
/// the deepest container holding all of it, then widened to cover any
/// anchor it only partly overlaps.
pub fn wrap_range(
    inlines: &mut Vec<Inline>,
    start: usize,
    end: usize,
    wrap: impl FnOnce(Vec<Inline>) -> Inline,
) {
    let mut pos = 0;
    for inline in inlines.iter_mut() {
        let len = inline.char_len();
        let inside = start >= pos && end <= pos + len;
        let whole = start == pos && end == pos + len;
        if inside && !whole {
            if let Some(children) = inline.children_mut() {
                wrap_range(children, start - pos, end - pos, wrap);
                return;
            }
        }
        pos += len;
    }

    let (start, end) = widen_to_anchors(inlines, start, end);
    let total = pos;

    let before = slice(inlines, 0, start);
    let mid = slice(inlines, start, end);
    let after = slice(inlines, end, total);

    let mut out = before;
    out.push(wrap(mid));
    out.extend(after);
    normalize_inlines(&mut out);
    *inlines = out;
}

fn anchor_extents(inlines: &[Inline], base: usize, out: &mut Vec<(usize, usize)>) {
    let mut pos = base;
    for inline in inlines {
        let len = inline.char_len();
        if let Inline::Anchor { .. } = inline {
            out.push((pos, pos + len));
        }
        if let Some(children) = inline.children() {
            anchor_extents(children, pos, out);
        }
        pos += len;
    }
}

fn widen_to_anchors(inlines: &[Inline], mut start: usize, mut end: usize) -> (usize, usize) {
    let mut extents = Vec::new();
    anchor_extents(inlines, 0, &mut extents);

    loop {
        let mut changed = false;
        for &(s, e) in &extents {
            let overlaps = s < end && e > start;
            let partial = s < start || e > end;
            if overlaps && partial {
                start = start.min(s);
                end = end.max(e);
                changed = true;
            }
        }
        if !changed {
            return (start, end);
        }
    }
}

/// Replace anchors with these ids by their children
pub fn unwrap_anchors(inlines: &mut Vec<Inline>, ids: &HashSet<String>) {
    let mut out = Vec::with_capacity(inlines.len());
    for mut inline in inlines.drain(..) {
        if let Some(children) = inline.children_mut() {
            unwrap_anchors(children, ids);
        }
        match inline {
            Inline::Anchor { id, children, .. } if ids.contains(&id) => out.extend(children),
            other => out.push(other),
        }
    }
    normalize_inlines(&mut out);
    *inlines = out;
}

/// Replace every link overlapping `start..end` by its children
pub fn unwrap_links_in_range(inlines: &mut Vec<Inline>, start: usize, end: usize) {
    let mut out = Vec::with_capacity(inlines.len());
    let mut pos = 0;

    for mut inline in inlines.drain(..) {
        let len = inline.char_len();
        let overlaps = start.max(pos) < end.min(pos + len);

        if overlaps {
            if let Some(children) = inline.children_mut() {
                unwrap_links_in_range(children, start.max(pos) - pos, end.min(pos + len) - pos);
            }
        }
        match inline {
            Inline::Link { children, .. } if overlaps => out.extend(children),
            other => out.push(other),
        }

        pos += len;
    }

    normalize_inlines(&mut out);
    *inlines = out;
}

/// Ids of every anchor in the run
pub fn anchor_ids_in(inlines: &[Inline]) -> HashSet<String> {
    let mut ids = HashSet::new();
    for inline in inlines {
        if let Inline::Anchor { id, .. } = inline {
            ids.insert(id.clone());
        }
        if let Some(children) = inline.children() {
            ids.extend(anchor_ids_in(children));
        }
    }
    ids
}

/// Split a run in two at `offset`. An anchor cut in half keeps its id on
/// the left part only.
pub fn split_run(inlines: &[Inline], offset: usize) -> (Vec<Inline>, Vec<Inline>) {
    let total: usize = inlines.iter().map(Inline::char_len).sum();
    let left = slice(inlines, 0, offset);
    let mut right = slice(inlines, offset, total);

    let shared: HashSet<String> = anchor_ids_in(&left)
        .intersection(&anchor_ids_in(&right))
        .cloned()
        .collect();
    if !shared.is_empty() {
        unwrap_anchors(&mut right, &shared);
    }

    (left, right)
}

/// Char-indexed edits on code block text
pub(crate) fn insert_str_at(text: &mut String, offset: usize, insert: &str) {
    let at = byte_offset(text, offset);
    text.insert_str(at, insert);
}

pub(crate) fn delete_chars(text: &mut String, start: usize, end: usize) {
    let from = byte_offset(text, start);
    let to = byte_offset(text, end);
    if from < to {
        text.replace_range(from..to, "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpress_parser::ast::inlines_text;

    fn bold() -> Marks {
        Marks {
            bold: true,
            ..Marks::default()
        }
    }

    fn anchor(id: &str, children: Vec<Inline>) -> Inline {
        Inline::Anchor {
            id: id.to_string(),
            resolved: false,
            children,
        }
    }

    #[test]
    fn test_map_splits_text_runs() {
        let mut run = vec![Inline::text("hello world")];
        map_leaves_in_range(&mut run, 6, 11, &mut |inline| match inline {
            Inline::Text { text, .. } => Inline::styled(text, bold()),
            other => other,
        });

        assert_eq!(
            run,
            vec![Inline::text("hello "), Inline::styled("world", bold())]
        );
    }

    #[test]
    fn test_map_enters_anchor_without_splitting_it() {
        let mut run = vec![anchor("a1", vec![Inline::text("abcdef")])];
        map_leaves_in_range(&mut run, 2, 4, &mut |inline| match inline {
            Inline::Text { text, .. } => Inline::styled(text, bold()),
            other => other,
        });

        assert_eq!(run.len(), 1);
        assert_eq!(
            run[0].children().unwrap(),
            &[
                Inline::text("ab"),
                Inline::styled("cd", bold()),
                Inline::text("ef")
            ]
        );
    }

    #[test]
    fn test_range_all_text() {
        let run = vec![Inline::text("ab"), Inline::styled("cd", bold())];
        assert!(range_all_text(&run, 2, 4, &|m| m.bold));
        assert!(!range_all_text(&run, 1, 4, &|m| m.bold));
        assert!(!range_all_text(&[Inline::LineBreak], 0, 1, &|m| m.bold));
    }

    #[test]
    fn test_delete_inside_anchor_keeps_one_anchor() {
        let mut run = vec![
            Inline::text("x "),
            anchor("a1", vec![Inline::text("important")]),
        ];
        delete_range(&mut run, 3, 5);

        assert_eq!(inlines_text(&run), "x iortant");
        assert_eq!(anchor_ids_in(&run).len(), 1);
    }

    #[test]
    fn test_delete_whole_anchor_removes_it() {
        let mut run = vec![
            Inline::text("x "),
            anchor("a1", vec![Inline::text("gone")]),
            Inline::text(" y"),
        ];
        delete_range(&mut run, 2, 6);
        assert_eq!(run, vec![Inline::text("x  y")]);
    }

    #[test]
    fn test_insert_text_takes_left_marks() {
        let mut run = vec![Inline::styled("bold", bold()), Inline::text(" plain")];
        insert_text(&mut run, 4, "er");

        assert_eq!(
            run,
            vec![Inline::styled("bolder", bold()), Inline::text(" plain")]
        );
    }

    #[test]
    fn test_insert_newline_becomes_break() {
        let mut run = vec![Inline::text("ab")];
        let inserted = insert_text(&mut run, 1, "\n");

        assert_eq!(inserted, 1);
        assert_eq!(
            run,
            vec![Inline::text("a"), Inline::LineBreak, Inline::text("b")]
        );
    }

    #[test]
    fn test_wrap_range_widens_over_partial_anchor() {
        let mut run = vec![
            Inline::text("one "),
            anchor("a1", vec![Inline::text("two")]),
            Inline::text(" three"),
        ];
        wrap_range(&mut run, 2, 5, |children| anchor("a2", children));

        assert_eq!(inlines_text(&run), "one two three");
        assert_eq!(run[0], Inline::text("on"));
        let outer = run[1].children().unwrap();
        assert_eq!(outer[0], Inline::text("e "));
        assert!(matches!(&outer[1], Inline::Anchor { id, .. } if id == "a1"));
        assert_eq!(anchor_ids_in(&run).len(), 2);
    }

    #[test]
    fn test_wrap_inside_link() {
        let mut run = vec![Inline::Link {
            href: "/x".to_string(),
            children: vec![Inline::text("click here")],
        }];
        wrap_range(&mut run, 6, 10, |children| anchor("a1", children));

        let children = run[0].children().unwrap();
        assert_eq!(children[0], Inline::text("click "));
        assert!(matches!(&children[1], Inline::Anchor { .. }));
    }

    #[test]
    fn test_unwrap_links_only_in_range() {
        let link = |text: &str| Inline::Link {
            href: "/x".to_string(),
            children: vec![Inline::text(text)],
        };
        let mut run = vec![link("one"), Inline::text(" and "), link("two")];
        unwrap_links_in_range(&mut run, 0, 2);

        assert_eq!(run[0], Inline::text("one and "));
        assert_eq!(run[1], link("two"));
    }

    #[test]
    fn test_split_run_keeps_anchor_on_left() {
        let run = vec![anchor("a1", vec![Inline::text("abcd")])];
        let (left, right) = split_run(&run, 2);

        assert_eq!(left, vec![anchor("a1", vec![Inline::text("ab")])]);
        assert_eq!(right, vec![Inline::text("cd")]);
    }

    #[test]
    fn test_code_text_helpers() {
        let mut code = "fn main() {}".to_string();
        insert_str_at(&mut code, 11, " x ");
        assert_eq!(code, "fn main() { x }");
        delete_chars(&mut code, 0, 3);
        assert_eq!(code, "main() { x }");
    }
}
