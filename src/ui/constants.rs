use ratatui::layout::Constraint;

pub(crate) const HELP_TEXT: &str = "(Tab) panel | (F2) health | (?) help | (q)uit";
pub(crate) const REMOTE_COMMANDS: &str = "(n)ew | (e)dit | (x)delete | (p)review | (/)search";
pub(crate) const LOCAL_COMMANDS: &str = "(Space) mark | (u)pload | (.) hidden";
pub(crate) const HEALTH_COMMANDS: &str = "(r)efresh now | (F2) back";

pub(crate) const LABEL_WIDTH: usize = 14;

pub(crate) const HEADER_HEIGHT: u16 = 3;
pub(crate) const STATUS_HEIGHT: u16 = 3;
pub(crate) const SPARKLINE_HEIGHT: u16 = 6;
pub(crate) const ACTIVITY_HEIGHT: u16 = 7;

pub(crate) const BROWSER_COLUMN_PERCENTAGES: [u16; 2] = [40, 60];

pub(crate) const MODAL_WIDTH_PERCENT: u16 = 70;
pub(crate) const MODAL_MAX_HEIGHT_PERCENT: u16 = 80;
pub(crate) const MODAL_MIN_WIDTH: u16 = 30;

pub(crate) const POPUP_MIN_WIDTH: u16 = 10;
pub(crate) const POPUP_MIN_HEIGHT: u16 = 5;

pub(crate) fn browser_columns() -> [Constraint; 2] {
    BROWSER_COLUMN_PERCENTAGES.map(Constraint::Percentage)
}
