//! Filter rule construction and last-match-wins evaluation.
use super::*;

const TEST_ID_STD: u32 = 0x222;
const TEST_ID_EXT: u32 = 0x1ABC_0222;

fn std_frame(identifier: u32) -> CanFrame {
    CanFrame::new(FrameFormat::ClassicStandard, identifier)
}

#[test]
/// An empty list admits nothing.
fn test_empty_list_rejects() {
    let list: FilterList<4> = FilterList::new();
    assert!(list.is_empty());
    assert!(!list.filter(&std_frame(TEST_ID_STD)));
    assert!(!list.filter(&std_frame(0)));
    assert!(!list.filter(&CanFrame::new(FrameFormat::FdExtended, TEST_ID_EXT)));
}

#[test]
/// Later rules override earlier ones; removing the override restores the result.
fn test_last_match_wins() {
    let frame = std_frame(TEST_ID_STD);
    let mut list: FilterList<8> = FilterList::new();

    let accept = FilterRule::accept(FrameFormat::ClassicStandard, 0x200, 0x240).unwrap();
    assert_eq!(list.append_filter(accept), Ok(0));
    assert!(list.filter(&frame));

    let reject = FilterRule::reject(FrameFormat::ClassicStandard, 0x200, 0x230).unwrap();
    assert_eq!(list.append_filter(reject), Ok(1));
    assert!(!list.filter(&frame));

    assert_eq!(list.remove_filter(1), Ok(reject));
    assert!(list.filter(&frame));
}

#[test]
/// Bounds are inclusive; one unit outside does not match.
fn test_boundaries() {
    let frame = std_frame(TEST_ID_STD);
    let mut list: FilterList<8> = FilterList::new();
    list.append_filter(FilterRule::accept(FrameFormat::ClassicStandard, 0x200, 0x240).unwrap())
        .unwrap();
    list.append_filter(FilterRule::reject(FrameFormat::ClassicStandard, 0x200, 0x221).unwrap())
        .unwrap();
    assert!(list.filter(&frame));
    list.append_filter(FilterRule::reject(FrameFormat::ClassicStandard, 0x223, 0x230).unwrap())
        .unwrap();
    assert!(list.filter(&frame));

    list.append_filter(FilterRule::reject(FrameFormat::ClassicStandard, 0x222, 0x222).unwrap())
        .unwrap();
    assert!(!list.filter(&frame));
    assert!(!list.filter(&std_frame(0x221)));
    assert!(list.filter(&std_frame(0x240)));
    assert!(!list.filter(&std_frame(0x241)));
}

#[test]
/// Rules only hit frames of their format unless they match any format.
fn test_format_selection() {
    let mut list: FilterList<4> = FilterList::new();
    list.append_filter(FilterRule::accept(FrameFormat::ClassicStandard, 0, 0x7FF).unwrap())
        .unwrap();
    assert!(list.filter(&std_frame(TEST_ID_STD)));
    assert!(!list.filter(&CanFrame::new(FrameFormat::FdStandard, TEST_ID_STD)));

    list.append_filter(FilterRule::accept(FormatMatch::Any, 0x1ABC_0000, 0x1ABC_FFFF).unwrap())
        .unwrap();
    assert!(list.filter(&CanFrame::new(FrameFormat::ClassicExtended, TEST_ID_EXT)));
    assert!(list.filter(&CanFrame::new(FrameFormat::FdExtended, TEST_ID_EXT)));
}

#[test]
/// Invalid ranges are refused at construction.
fn test_invalid_rules() {
    assert_eq!(
        FilterRule::accept(FrameFormat::ClassicStandard, 0x300, 0x280),
        Err(FilterError::InvalidRange {
            low: 0x300,
            high: 0x280
        })
    );
    assert_eq!(
        FilterRule::reject(FrameFormat::FdStandard, 0x100, 0x800),
        Err(FilterError::IdentifierOutOfRange {
            high: 0x800,
            mask: 0x7FF
        })
    );
    assert!(FilterRule::reject(FrameFormat::FdExtended, 0x100, 0x800).is_ok());
    assert!(FilterRule::accept(FormatMatch::Any, 0, 0x2000_0000).is_err());
}

#[test]
/// Capacity and index errors.
fn test_list_bounds() {
    let rule = FilterRule::accept(FormatMatch::Any, 0, 1).unwrap();
    let mut list: FilterList<2> = FilterList::new();
    assert_eq!(list.append_filter(rule), Ok(0));
    assert_eq!(list.append_filter(rule), Ok(1));
    assert_eq!(list.append_filter(rule), Err(FilterError::ListFull));
    assert_eq!(
        list.remove_filter(2),
        Err(FilterError::IndexOutOfRange { index: 2, len: 2 })
    );
    list.clear();
    assert_eq!(list.len(), 0);
}

#[test]
/// Removing a rule shifts the following indices down.
fn test_remove_shifts_indices() {
    let mut list: FilterList<4> = FilterList::new();
    let first = FilterRule::accept(FormatMatch::Any, 0x10, 0x20).unwrap();
    let second = FilterRule::reject(FormatMatch::Any, 0x30, 0x40).unwrap();
    let third = FilterRule::accept(FormatMatch::Any, 0x50, 0x60).unwrap();
    list.append_filter(first).unwrap();
    list.append_filter(second).unwrap();
    list.append_filter(third).unwrap();
    list.remove_filter(0).unwrap();
    assert_eq!(list.get(0), Some(&second));
    assert_eq!(list.get(1), Some(&third));
    assert_eq!(list.iter().count(), 2);
}
