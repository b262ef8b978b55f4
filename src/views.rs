use crate::models::{CommentRecord, VideoRecord};
use crate::share;
use crate::theme::Theme;
use gpui::prelude::*;
use gpui::{div, img, px, rems, AnyElement, Div, FontWeight, Hsla, ObjectFit};

pub(crate) fn render_avatar(url: &str, size: f32) -> impl IntoElement {
    img(url.to_string())
        .w(px(size))
        .h(px(size))
        .flex_shrink_0()
        .rounded_full()
        .object_fit(ObjectFit::Cover)
}

/// Icon over a counter, as used in the interaction column.
pub(crate) fn render_action(theme: &Theme, icon: &str, label: String, active: Option<Hsla>) -> Div {
    div()
        .flex()
        .flex_col()
        .items_center()
        .gap_1()
        .child(
            div()
                .w(px(44.))
                .h(px(44.))
                .flex()
                .items_center()
                .justify_center()
                .rounded_full()
                .bg(theme.bg_overlay)
                .text_xl()
                .text_color(active.unwrap_or(theme.text_primary))
                .child(icon.to_string()),
        )
        .child(
            div()
                .text_xs()
                .font_weight(FontWeight::MEDIUM)
                .text_color(theme.text_primary)
                .child(label),
        )
}

pub(crate) fn render_progress_bar(theme: &Theme, progress: f32) -> AnyElement {
    let progress = progress.clamp(0.0, 1.0);
    div()
        .w_full()
        .h(px(3.))
        .bg(theme.border_subtle)
        .child(div().h_full().w(gpui::relative(progress)).bg(theme.text_primary))
        .into_any_element()
}

pub(crate) fn render_video_info(theme: &Theme, video: &VideoRecord) -> AnyElement {
    let location = video.location.clone();
    let host = share::media_host(video);
    div()
        .w_full()
        .flex()
        .flex_col()
        .gap_2()
        .child(
            div()
                .flex()
                .items_center()
                .gap_2()
                .child(
                    div()
                        .text_base()
                        .font_weight(FontWeight::SEMIBOLD)
                        .text_color(theme.text_primary)
                        .child(video.author.name.clone()),
                )
                .child(
                    div()
                        .text_xs()
                        .text_color(theme.text_muted)
                        .child(format!("· {}", video.formatted_time())),
                ),
        )
        .child(
            div()
                .w_full()
                .text_sm()
                .line_height(rems(1.5))
                .text_color(theme.text_primary)
                .whitespace_normal()
                .child(video.caption()),
        )
        .child(
            div()
                .flex()
                .flex_wrap()
                .gap_2()
                .text_sm()
                .font_weight(FontWeight::MEDIUM)
                .text_color(theme.text_secondary)
                .children(video.all_tags().into_iter().map(|tag| div().child(tag))),
        )
        .child(
            div()
                .flex()
                .items_center()
                .gap_3()
                .text_xs()
                .text_color(theme.text_secondary)
                .child(format!("♪ {}", video.music_label()))
                .when_some(location, |this, location| {
                    this.child(div().text_color(theme.text_muted).child(format!("📍 {location}")))
                })
                .when_some(host, |this, host| {
                    this.child(div().text_color(theme.text_muted).child(host))
                }),
        )
        .into_any_element()
}

/// Avatar, author, text and meta row of one comment. Replies are indented.
pub(crate) fn render_comment_body(
    theme: &Theme,
    comment: &CommentRecord,
    liked: bool,
    is_reply: bool,
) -> Div {
    let like_color = if liked { theme.accent } else { theme.text_muted };
    let avatar_size = if is_reply { 24. } else { 32. };

    div()
        .w_full()
        .min_w(px(0.))
        .when(is_reply, |this| this.pl(px(44.)))
        .flex()
        .flex_row()
        .gap_3()
        .child(render_avatar(&comment.user.avatar, avatar_size))
        .child(
            div()
                .flex_1()
                .min_w(px(0.))
                .flex()
                .flex_col()
                .gap_1()
                .child(
                    div()
                        .text_xs()
                        .text_color(theme.text_muted)
                        .child(comment.user.name.clone()),
                )
                .child(
                    div()
                        .w_full()
                        .text_sm()
                        .line_height(rems(1.5))
                        .text_color(theme.text_primary)
                        .whitespace_normal()
                        .child(comment.content.clone()),
                )
                .child(
                    div()
                        .flex()
                        .items_center()
                        .gap_3()
                        .text_xs()
                        .text_color(theme.text_muted)
                        .child(comment.formatted_time())
                        .child(
                            div()
                                .text_color(like_color)
                                .child(format!("♥ {}", comment.likes)),
                        ),
                ),
        )
}
