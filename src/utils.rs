use std::error::Error;

/// Boxed static error type
pub type Err = Box<dyn Error + Send + Sync + 'static>;

/// Takes a list where each element is a set of choices, and returns all the possible sets
/// generated. Will clone the elements. The first list varies fastest.
///
/// ```
/// let v = vec![
///   vec![1],
///   vec![2, 3],
///   vec![4],
///   vec![5, 6, 7],
/// ];
/// let v = v.iter().map(Vec::as_slice).collect::<Vec<_>>();
///
/// assert_eq!(npchunk::utils::combinations(&v), vec![
///   vec![1, 2, 4, 5],
///   vec![1, 3, 4, 5],
///   vec![1, 2, 4, 6],
///   vec![1, 3, 4, 6],
///   vec![1, 2, 4, 7],
///   vec![1, 3, 4, 7],
/// ]);
/// ```
pub fn combinations<T>(list: &[&[T]]) -> Vec<Vec<T>>
where
  T: Clone,
{
  if list.is_empty() {
    Vec::new()
  } else if list.len() == 1 {
    list[0].iter().map(|e| vec![e.clone()]).collect()
  } else {
    let (head, tail) = list.split_at(1);
    let head = head[0];

    combinations(tail)
      .into_iter()
      .flat_map(|subseq| {
        // prepend every element of the head to every possible subseq
        head.iter().map(move |v| {
          let mut newseq = Vec::with_capacity(subseq.len() + 1);
          newseq.push(v.clone());
          newseq.extend(subseq.iter().cloned());
          newseq
        })
      })
      .collect()
  }
}

#[test]
fn test_combinations_empty_choice() {
  let v = vec![vec![1, 2], vec![], vec![3]];
  let v = v.iter().map(Vec::as_slice).collect::<Vec<_>>();
  assert!(combinations(&v).is_empty());
}
