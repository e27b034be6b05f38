//! Unit tests for input translation.

use rstest::rstest;

use super::*;

#[rstest]
#[case::plain("hello", "hello")]
#[case::less_than("a<b", "a<LT>b")]
#[case::nul("x\0y", "x<Nul>y")]
#[case::already_notation_is_escaped("<Esc>", "<LT>Esc>")]
fn text_is_escaped_for_input(#[case] text: &str, #[case] expected: &str) {
    assert_eq!(text_notation(text), expected);
}

#[rstest]
#[case::plain('a', Modifiers::empty(), "a")]
#[case::shifted_letter('A', Modifiers::SHIFT, "A")]
#[case::control('w', Modifiers::CTRL, "<C-w>")]
#[case::alt('x', Modifiers::ALT, "<M-x>")]
#[case::control_alt('d', Modifiers::CTRL.union(Modifiers::ALT), "<C-M-d>")]
#[case::control_shift('a', Modifiers::CTRL.union(Modifiers::SHIFT), "<C-S-a>")]
#[case::shifted_space(' ', Modifiers::SHIFT, "<S-Space>")]
#[case::less_than('<', Modifiers::empty(), "<LT>")]
#[case::control_less_than('<', Modifiers::CTRL, "<C-lt>")]
#[case::nul('\0', Modifiers::empty(), "<Nul>")]
#[case::super_key('s', Modifiers::SUPER, "<D-s>")]
fn characters_use_vim_notation(
    #[case] ch: char,
    #[case] modifiers: Modifiers,
    #[case] expected: &str,
) {
    assert_eq!(char_notation(ch, modifiers), expected);
}

#[rstest]
fn modifier_prefix_is_ordered() {
    let all = Modifiers::all();

    assert_eq!(all.prefix(), "C-M-S-D-");
    assert_eq!(Modifiers::empty().prefix(), "");
}

#[rstest]
fn whole_notches_are_emitted_immediately() {
    let mut wheel = WheelAccumulator::new();

    assert_eq!(wheel.feed(240), Some((MouseAction::WheelUp, 2)));
    assert_eq!(wheel.buffered(), 0);
    assert_eq!(wheel.feed(-WHEEL_NOTCH), Some((MouseAction::WheelDown, 1)));
}

#[rstest]
fn fractional_deltas_accumulate_into_notches() {
    let mut wheel = WheelAccumulator::new();

    assert_eq!(wheel.feed(40), None);
    assert_eq!(wheel.feed(40), None);
    assert_eq!(wheel.feed(60), Some((MouseAction::WheelUp, 1)));
    assert_eq!(wheel.buffered(), 20);
}

#[rstest]
fn reversing_direction_cancels_the_remainder() {
    let mut wheel = WheelAccumulator::new();

    assert_eq!(wheel.feed(90), None);
    assert_eq!(wheel.feed(-150), None);
    assert_eq!(wheel.buffered(), -60);
    assert_eq!(wheel.feed(-60), Some((MouseAction::WheelDown, 1)));
    assert_eq!(wheel.buffered(), 0);
}
