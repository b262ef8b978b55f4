use gpui::{hsla, Hsla};

pub struct Theme {
    pub bg_primary: Hsla,
    pub bg_secondary: Hsla,
    pub bg_tertiary: Hsla,
    pub bg_hover: Hsla,
    pub bg_overlay: Hsla,
    pub text_primary: Hsla,
    pub text_secondary: Hsla,
    pub text_muted: Hsla,
    pub accent: Hsla,
    pub accent_hover: Hsla,
    pub favorite: Hsla,
    pub border: Hsla,
    pub border_subtle: Hsla,
    pub error: Hsla,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            bg_primary: hsla(0., 0., 0.0, 1.0),
            bg_secondary: hsla(240., 0.08, 0.09, 1.0),
            bg_tertiary: hsla(240., 0.06, 0.16, 1.0),
            bg_hover: hsla(240., 0.06, 0.20, 1.0),
            bg_overlay: hsla(0., 0., 0.0, 0.55),
            text_primary: hsla(0., 0., 0.96, 1.0),
            text_secondary: hsla(0., 0., 0.75, 1.0),
            text_muted: hsla(0., 0., 0.52, 1.0),
            accent: hsla(349., 0.99, 0.58, 1.0), // 抖音红
            accent_hover: hsla(349., 0.99, 0.52, 1.0),
            favorite: hsla(45., 1.0, 0.55, 1.0),
            border: hsla(0., 0., 0.28, 1.0),
            border_subtle: hsla(0., 0., 0.18, 1.0),
            error: hsla(0., 0.72, 0.51, 1.0),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
