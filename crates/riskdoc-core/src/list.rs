//! Ordered row collections.
//!
//! Every tabular schema and every nested sub-collection is edited through the
//! three operations here. Sequence columns are not maintained automatically:
//! callers re-stamp them with [`renumber`] after any structural change.

use crate::{Error, Result};

/// A row carrying a 1-based sequence column.
pub trait Ordinal {
  fn set_ordinal(&mut self, number: u32);
}

/// Append `item` to the end of `list`.
pub fn add<T>(list: &mut Vec<T>, item: T) { list.push(item); }

/// Remove and return the element at `index`, keeping the relative order of
/// the remaining elements.
pub fn delete_at<T>(list: &mut Vec<T>, index: usize) -> Result<T> {
  check(index, list.len())?;
  Ok(list.remove(index))
}

/// Remove the element at `from` and reinsert it at `to` in the shortened
/// sequence.
///
/// Both indices are checked against the pre-move length. `from == to` leaves
/// the list untouched.
pub fn move_to<T>(list: &mut [T], from: usize, to: usize) -> Result<()> {
  check(from, list.len())?;
  check(to, list.len())?;

  // Removing at `from` and inserting at `to` is a rotation of the span
  // between them.
  if from < to {
    list[from..=to].rotate_left(1);
  } else if to < from {
    list[to..=from].rotate_right(1);
  }
  Ok(())
}

/// Re-stamp the sequence column as `1..=N` in list order.
pub fn renumber<T: Ordinal>(list: &mut [T]) {
  for (i, row) in list.iter_mut().enumerate() {
    row.set_ordinal(i as u32 + 1);
  }
}

/// Where the element previously at `index` sits after `move_to(from, to)`.
pub fn moved_index(index: usize, from: usize, to: usize) -> usize {
  if index == from {
    to
  } else if from < to && index > from && index <= to {
    index - 1
  } else if to < from && index >= to && index < from {
    index + 1
  } else {
    index
  }
}

fn check(index: usize, len: usize) -> Result<()> {
  if index < len {
    Ok(())
  } else {
    Err(Error::OutOfRange { index, len })
  }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  #[derive(Debug, Clone, PartialEq)]
  struct Numbered {
    number: u32,
    name:   &'static str,
  }

  impl Ordinal for Numbered {
    fn set_ordinal(&mut self, number: u32) { self.number = number; }
  }

  #[test]
  fn add_appends() {
    let mut list = vec![1, 2];
    add(&mut list, 3);
    assert_eq!(list, [1, 2, 3]);
  }

  #[test]
  fn delete_at_preserves_order() {
    let mut list = vec!['a', 'b', 'c', 'd'];
    assert_eq!(delete_at(&mut list, 1).unwrap(), 'b');
    assert_eq!(list, ['a', 'c', 'd']);
  }

  #[test]
  fn delete_at_out_of_range() {
    let mut list = vec![1];
    let err = delete_at(&mut list, 1).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { index: 1, len: 1 }));
    assert_eq!(list, [1]);

    let mut empty: Vec<u8> = Vec::new();
    assert!(delete_at(&mut empty, 0).is_err());
  }

  #[test]
  fn move_forward_and_backward() {
    let mut list = vec!['a', 'b', 'c', 'd'];
    move_to(&mut list, 0, 2).unwrap();
    assert_eq!(list, ['b', 'c', 'a', 'd']);

    move_to(&mut list, 3, 0).unwrap();
    assert_eq!(list, ['d', 'b', 'c', 'a']);
  }

  #[test]
  fn move_same_index_is_noop() {
    let mut list = vec!['a', 'b'];
    move_to(&mut list, 1, 1).unwrap();
    assert_eq!(list, ['a', 'b']);
  }

  #[test]
  fn move_rejects_invalid_indices() {
    let mut list = vec!['a', 'b'];
    assert!(matches!(
      move_to(&mut list, 2, 0),
      Err(Error::OutOfRange { index: 2, len: 2 })
    ));
    assert!(matches!(
      move_to(&mut list, 0, 2),
      Err(Error::OutOfRange { index: 2, len: 2 })
    ));
    assert_eq!(list, ['a', 'b']);
  }

  #[test]
  fn renumber_restamps_after_move() {
    let mut rows = vec![
      Numbered { number: 1, name: "press" },
      Numbered { number: 2, name: "crane" },
      Numbered { number: 3, name: "lift" },
    ];
    move_to(&mut rows, 2, 0).unwrap();
    renumber(&mut rows);

    let got: Vec<_> = rows.iter().map(|r| (r.number, r.name)).collect();
    assert_eq!(got, [(1, "lift"), (2, "press"), (3, "crane")]);
  }

  #[test]
  fn moved_index_tracks_every_element() {
    let original = vec![0, 1, 2, 3, 4];
    for from in 0..5 {
      for to in 0..5 {
        let mut list = original.clone();
        move_to(&mut list, from, to).unwrap();
        for (old, value) in original.iter().enumerate() {
          assert_eq!(list[moved_index(old, from, to)], *value);
        }
      }
    }
  }

  fn list_and_index() -> impl Strategy<Value = (Vec<u16>, usize)> {
    prop::collection::vec(any::<u16>(), 1..32)
      .prop_flat_map(|v| {
        let len = v.len();
        (Just(v), 0..len)
      })
  }

  fn list_and_two_indices() -> impl Strategy<Value = (Vec<u16>, usize, usize)> {
    prop::collection::vec(any::<u16>(), 1..32)
      .prop_flat_map(|v| {
        let len = v.len();
        (Just(v), 0..len, 0..len)
      })
  }

  proptest! {
    #[test]
    fn delete_keeps_remaining_order((list, i) in list_and_index()) {
      let mut edited = list.clone();
      let removed = delete_at(&mut edited, i).unwrap();

      let mut expected = list.clone();
      expected.remove(i);
      prop_assert_eq!(removed, list[i]);
      prop_assert_eq!(edited.len(), list.len() - 1);
      prop_assert_eq!(edited, expected);
    }

    #[test]
    fn move_round_trip_restores_order((list, i, j) in list_and_two_indices()) {
      let mut edited = list.clone();
      move_to(&mut edited, i, j).unwrap();
      move_to(&mut edited, j, i).unwrap();
      prop_assert_eq!(edited, list);
    }

    #[test]
    fn add_grows_by_one(
      list in prop::collection::vec(any::<u16>(), 0..32),
      item in any::<u16>()
    ) {
      let mut edited = list.clone();
      add(&mut edited, item);
      prop_assert_eq!(edited.len(), list.len() + 1);
      prop_assert_eq!(edited.last(), Some(&item));
    }
  }
}
