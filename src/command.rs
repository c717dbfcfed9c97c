use std::fmt;
use std::path::PathBuf;

use crate::canvas::ScrollBehavior;
use crate::plugins::page::ScrollAnchor;
use crate::plugins::zoom::FitMode;

/// Every command a first-party plugin can contribute
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SetZoom(f64),
    GetZoom,
    ZoomIn(Option<f64>),
    ZoomOut(Option<f64>),
    ResetZoom,
    ZoomToFit(Option<FitMode>),

    SetPage(usize),
    GetPage,

    EnableDrag,
    DisableDrag,
    ToggleDrag,
    ScrollToPage {
        page: usize,
        align: Option<ScrollAnchor>,
        behavior: Option<ScrollBehavior>,
    },
    SetScrollX {
        x: f64,
        behavior: Option<ScrollBehavior>,
    },
    SetScrollY {
        y: f64,
        behavior: Option<ScrollBehavior>,
    },
    SetScroll {
        x: f64,
        y: f64,
        behavior: Option<ScrollBehavior>,
    },
    GetScrollX,
    GetScrollY,

    Download {
        file_name: Option<String>,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::SetZoom(_) => CommandKind::SetZoom,
            Self::GetZoom => CommandKind::GetZoom,
            Self::ZoomIn(_) => CommandKind::ZoomIn,
            Self::ZoomOut(_) => CommandKind::ZoomOut,
            Self::ResetZoom => CommandKind::ResetZoom,
            Self::ZoomToFit(_) => CommandKind::ZoomToFit,
            Self::SetPage(_) => CommandKind::SetPage,
            Self::GetPage => CommandKind::GetPage,
            Self::EnableDrag => CommandKind::EnableDrag,
            Self::DisableDrag => CommandKind::DisableDrag,
            Self::ToggleDrag => CommandKind::ToggleDrag,
            Self::ScrollToPage { .. } => CommandKind::ScrollToPage,
            Self::SetScrollX { .. } => CommandKind::SetScrollX,
            Self::SetScrollY { .. } => CommandKind::SetScrollY,
            Self::SetScroll { .. } => CommandKind::SetScroll,
            Self::GetScrollX => CommandKind::GetScrollX,
            Self::GetScrollY => CommandKind::GetScrollY,
            Self::Download { .. } => CommandKind::Download,
        }
    }

    /// `scrollToPage` with the plugin's default alignment and behavior
    pub fn scroll_to_page(page: usize) -> Self {
        Self::ScrollToPage {
            page,
            align: None,
            behavior: None,
        }
    }
}

/// Key into the command namespace
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    SetZoom,
    GetZoom,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    ZoomToFit,
    SetPage,
    GetPage,
    EnableDrag,
    DisableDrag,
    ToggleDrag,
    ScrollToPage,
    SetScrollX,
    SetScrollY,
    SetScroll,
    GetScrollX,
    GetScrollY,
    Download,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetZoom => "setZoom",
            Self::GetZoom => "getZoom",
            Self::ZoomIn => "zoomIn",
            Self::ZoomOut => "zoomOut",
            Self::ResetZoom => "resetZoom",
            Self::ZoomToFit => "zoomToFit",
            Self::SetPage => "setPage",
            Self::GetPage => "getPage",
            Self::EnableDrag => "enableDrag",
            Self::DisableDrag => "disableDrag",
            Self::ToggleDrag => "toggleDrag",
            Self::ScrollToPage => "scrollToPage",
            Self::SetScrollX => "setScrollX",
            Self::SetScrollY => "setScrollY",
            Self::SetScroll => "setScroll",
            Self::GetScrollX => "getScrollX",
            Self::GetScrollY => "getScrollY",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a command hands back to its caller
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CommandOutput {
    #[default]
    None,
    Zoom(f64),
    Page(usize),
    Offset(f64),
    Downloaded(PathBuf),
}

impl CommandOutput {
    pub fn as_zoom(&self) -> Option<f64> {
        match self {
            Self::Zoom(z) => Some(*z),
            _ => None,
        }
    }

    pub fn as_page(&self) -> Option<usize> {
        match self {
            Self::Page(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_offset(&self) -> Option<f64> {
        match self {
            Self::Offset(o) => Some(*o),
            _ => None,
        }
    }
}
