use super::*;

fn rows(count: u32) -> Vec<u32> {
    (1..=count).collect()
}

#[test]
fn select_returns_every_row() {
    assert_eq!(
        finish(ExecutionMode::Select, rows(3), None),
        Ok(QueryOutput::Rows(vec![1, 2, 3]))
    );
}

#[test]
fn first_requires_a_row_unless_defaulted() {
    assert_eq!(
        finish(ExecutionMode::First, rows(2), None),
        Ok(QueryOutput::Row(Some(1)))
    );
    assert_eq!(
        finish(ExecutionMode::First, rows(0), None),
        Err(ExecuteError::NoElements)
    );
    assert_eq!(
        finish(ExecutionMode::FirstOrDefault, rows(0), None),
        Ok(QueryOutput::Row(None))
    );
}

#[test]
fn single_detects_ambiguity() {
    assert_eq!(
        finish(ExecutionMode::Single, rows(1), None),
        Ok(QueryOutput::Row(Some(1)))
    );
    assert_eq!(
        finish(ExecutionMode::Single, rows(2), None),
        Err(ExecuteError::MoreThanOneElement)
    );
    assert_eq!(
        finish(ExecutionMode::SingleOrDefault, rows(2), None),
        Err(ExecuteError::MoreThanOneElement)
    );
    assert_eq!(
        finish(ExecutionMode::Single, rows(0), None),
        Err(ExecuteError::NoElements)
    );
    assert_eq!(
        finish(ExecutionMode::SingleOrDefault, rows(0), None),
        Ok(QueryOutput::Row(None))
    );
}

#[test]
fn aggregates_reduce_rows() {
    assert_eq!(finish(ExecutionMode::Count, rows(4), None), Ok(QueryOutput::Count(4)));
    assert_eq!(finish(ExecutionMode::Any, rows(1), None), Ok(QueryOutput::Bool(true)));
    assert_eq!(finish(ExecutionMode::Any, rows(0), None), Ok(QueryOutput::Bool(false)));
    assert_eq!(finish(ExecutionMode::All, rows(0), None), Ok(QueryOutput::Bool(true)));
    assert_eq!(finish(ExecutionMode::All, rows(1), None), Ok(QueryOutput::Bool(false)));
}

#[test]
fn element_at_picks_by_index() {
    assert_eq!(
        finish(ExecutionMode::ElementAt, rows(3), Some(2)),
        Ok(QueryOutput::Row(Some(3)))
    );
    assert_eq!(
        finish(ExecutionMode::ElementAt, rows(2), Some(2)),
        Err(ExecuteError::IndexOutOfRange { index: 2 })
    );
    assert_eq!(
        finish(ExecutionMode::ElementAtOrDefault, rows(2), Some(5)),
        Ok(QueryOutput::Row(None))
    );
}

#[test]
fn outputs_flatten_to_rows() {
    assert_eq!(QueryOutput::Row(Some(7)).into_rows(), vec![7]);
    assert!(QueryOutput::<u32>::Count(3).into_rows().is_empty());
}
