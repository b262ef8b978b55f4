mod api;
mod comments;
mod config;
mod error;
mod feed;
mod format;
mod interaction;
mod models;
mod player;
mod search;
mod session;
mod share;
mod shortcuts;
mod storage;
mod theme;
mod views;


use api::{MockFeedClient, PostCommentRequest};
use comments::SendComment;
use config::AppConfig;
use error::FeedError;
use gpui::prelude::*;
use gpui::{
    div, hsla, img, point, px, size, AnyElement, App, AppContext, AsyncWindowContext, Bounds,
    ClipboardItem, Div, ElementId, FocusHandle, FontWeight, KeyDownEvent, Keystroke, ObjectFit,
    Render, ScrollHandle, SharedString, Stateful, TitlebarOptions, ViewContext, WeakView,
    WindowBounds, WindowOptions,
};
use models::{CommentRecord, CommentSort};
use player::PlayerHandle;
use reqwest_client::ReqwestClient;
use session::{InputFocus, KeyEffect, Session};
use shortcuts::ShortcutAction;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use storage::Storage;
use theme::Theme;

/// macOS traffic light 按钮区域的高度
const TITLEBAR_HEIGHT: f32 = 38.0;
const SIDEBAR_WIDTH: f32 = 56.0;
const DRAWER_WIDTH: f32 = 420.0;
const TICK_INTERVAL: Duration = Duration::from_millis(250);
const NOTICE_DURATION: Duration = Duration::from_secs(2);
const CURRENT_USER_ID: &str = "current-user";

// Application State
struct AppState {
    theme: Theme,
    session: Session,
    client: Arc<MockFeedClient>,
    focus_handle: FocusHandle,
    comment_scroll: ScrollHandle,
    expanded_threads: HashSet<String>,
    is_loading_feed: bool,
    error_message: Option<String>,
    notice: Option<String>,
    notice_generation: u64,
}

impl AppState {
    fn new(config: AppConfig, storage: Storage, cx: &mut ViewContext<Self>) -> Self {
        let client = MockFeedClient::new(cx.background_executor().clone(), &config);
        Self {
            theme: Theme::default(),
            session: Session::new(config, storage),
            client: Arc::new(client),
            focus_handle: cx.focus_handle(),
            comment_scroll: ScrollHandle::new(),
            expanded_threads: HashSet::new(),
            is_loading_feed: true,
            error_message: None,
            notice: None,
            notice_generation: 0,
        }
    }

    fn load_feed(&mut self, cx: &mut ViewContext<Self>) {
        self.is_loading_feed = true;
        self.error_message = None;
        cx.notify();

        let client = self.client.clone();

        cx.spawn(
            |this: WeakView<Self>, mut cx: AsyncWindowContext| async move {
                let videos = client.fetch_video_list().await;
                let _ = this.update(&mut cx, |this: &mut Self, cx: &mut ViewContext<Self>| {
                    if let Err(e) = this.session.install_feed(videos) {
                        log::error!("failed to load feed: {e}");
                        this.error_message = Some(format!("加载视频失败: {}", e));
                    }
                    this.is_loading_feed = false;
                    cx.notify();
                });
            },
        )
        .detach();
    }

    /// Drives the simulated player until the view is dropped.
    fn start_playback_clock(&mut self, cx: &mut ViewContext<Self>) {
        let executor = cx.background_executor().clone();

        cx.spawn(
            |this: WeakView<Self>, mut cx: AsyncWindowContext| async move {
                loop {
                    executor.timer(TICK_INTERVAL).await;
                    let result =
                        this.update(&mut cx, |this: &mut Self, cx: &mut ViewContext<Self>| {
                            let was_playing = this.session.playback.is_playing();
                            let advanced = this.session.tick(TICK_INTERVAL.as_secs_f64());
                            if advanced {
                                this.after_video_changed(cx);
                            }
                            if was_playing || advanced {
                                cx.notify();
                            }
                        });
                    if result.is_err() {
                        break;
                    }
                }
            },
        )
        .detach();
    }

    fn show_notice(&mut self, message: impl Into<String>, cx: &mut ViewContext<Self>) {
        self.notice = Some(message.into());
        self.notice_generation += 1;
        let generation = self.notice_generation;
        let executor = cx.background_executor().clone();

        cx.spawn(
            |this: WeakView<Self>, mut cx: AsyncWindowContext| async move {
                executor.timer(NOTICE_DURATION).await;
                let _ = this.update(&mut cx, |this: &mut Self, cx: &mut ViewContext<Self>| {
                    if this.notice_generation == generation {
                        this.notice = None;
                        cx.notify();
                    }
                });
            },
        )
        .detach();
        cx.notify();
    }

    fn take_session_notice(&mut self, cx: &mut ViewContext<Self>) {
        if let Some(message) = self.session.notice.take() {
            self.show_notice(message, cx);
        }
    }

    fn open_comments(&mut self, cx: &mut ViewContext<Self>) {
        self.expanded_threads.clear();
        if let Some(pending) = self.session.open_comments() {
            let client = self.client.clone();

            cx.spawn(
                |this: WeakView<Self>, mut cx: AsyncWindowContext| async move {
                    let comments = client.fetch_comments(&pending.video_id).await;
                    let _ = this.update(&mut cx, |this: &mut Self, cx: &mut ViewContext<Self>| {
                        this.session
                            .comments
                            .install_fetched(&pending.video_id, comments);
                        cx.notify();
                    });
                },
            )
            .detach();
        }
        cx.notify();
    }

    fn toggle_comments(&mut self, cx: &mut ViewContext<Self>) {
        if self.session.comments_open {
            self.session.close_comments();
            cx.notify();
        } else {
            self.open_comments(cx);
        }
    }

    fn after_video_changed(&mut self, cx: &mut ViewContext<Self>) {
        self.expanded_threads.clear();
        if self.session.comments_open {
            self.open_comments(cx);
        }
    }

    fn submit_comment(&mut self, cx: &mut ViewContext<Self>) {
        match self.session.submit_comment() {
            Some(request) => self.send_comment(request, cx),
            None => self.take_session_notice(cx),
        }
        cx.notify();
    }

    fn send_comment(&mut self, request: SendComment, cx: &mut ViewContext<Self>) {
        let client = self.client.clone();

        cx.spawn(
            |this: WeakView<Self>, mut cx: AsyncWindowContext| async move {
                let result = client
                    .post_comment(PostCommentRequest {
                        video_id: &request.video_id,
                        content: &request.content,
                        parent_id: request.parent_id.as_deref(),
                    })
                    .await
                    .and_then(|posted| {
                        if posted.success {
                            Ok(posted.comment)
                        } else {
                            Err(FeedError::PostFailed(request.video_id.clone()))
                        }
                    });

                let _ = this.update(&mut cx, |this: &mut Self, cx: &mut ViewContext<Self>| {
                    match result {
                        Ok(comment) => match this.session.comments.apply_sent(&request, comment) {
                            Ok(()) => {
                                if let Some(parent_id) = request.parent_id.clone() {
                                    this.expanded_threads.insert(parent_id);
                                    this.show_notice("回复成功", cx);
                                } else {
                                    this.comment_scroll.scroll_to_item(0);
                                    this.show_notice("评论发布成功", cx);
                                }
                            }
                            Err(e) => {
                                log::warn!("sent comment was not applied: {e}");
                                this.show_notice(FeedError::PostFailed(e.to_string()).notice(), cx);
                            }
                        },
                        Err(e) => {
                            this.session.comments.fail_send(&e);
                            this.show_notice(e.notice(), cx);
                        }
                    }
                    cx.notify();
                });
            },
        )
        .detach();
    }

    fn submit_search(&mut self, cx: &mut ViewContext<Self>) {
        if let Some(video_id) = self.session.submit_search() {
            self.open_linked_video(video_id, cx);
        }
        cx.notify();
    }

    fn open_linked_video(&mut self, video_id: String, cx: &mut ViewContext<Self>) {
        let client = self.client.clone();

        cx.spawn(
            |this: WeakView<Self>, mut cx: AsyncWindowContext| async move {
                let result = client.fetch_video_by_id(&video_id).await;
                let _ = this.update(&mut cx, |this: &mut Self, cx: &mut ViewContext<Self>| {
                    match result {
                        Ok(video) if this.session.open_video(&video.id) => {
                            this.after_video_changed(cx);
                        }
                        Ok(video) => {
                            log::warn!("video {} is not part of the feed", video.id);
                            this.show_notice(FeedError::VideoNotFound(video.id).notice(), cx);
                        }
                        Err(e) => this.show_notice(e.notice(), cx),
                    }
                    cx.notify();
                });
            },
        )
        .detach();
    }

    fn like_comment(&mut self, comment_id: &str, cx: &mut ViewContext<Self>) {
        if let Err(e) = self.session.comments.like_comment(comment_id) {
            log::warn!("failed to like comment: {e}");
        }
        cx.notify();
    }

    fn delete_comment(
        &mut self,
        comment_id: &str,
        parent_id: Option<&str>,
        cx: &mut ViewContext<Self>,
    ) {
        let Some(video_id) = self.session.current_video().map(|v| v.id.clone()) else {
            return;
        };
        match self
            .session
            .comments
            .delete_comment(&video_id, comment_id, parent_id)
        {
            Ok(_) => self.show_notice("已删除", cx),
            Err(e) => self.show_notice(e.notice(), cx),
        }
    }

    fn toggle_thread(&mut self, comment_id: &str, cx: &mut ViewContext<Self>) {
        if !self.expanded_threads.remove(comment_id) {
            self.expanded_threads.insert(comment_id.to_string());
        }
        cx.notify();
    }

    fn run_action(&mut self, action: ShortcutAction, cx: &mut ViewContext<Self>) {
        let effect = self.session.run_shortcut(action);
        self.handle_effect(effect, cx);
    }

    /// Applies whatever follow-up work a key or button asked for.
    /// Returns `false` when nothing happened.
    fn handle_effect(&mut self, effect: KeyEffect, cx: &mut ViewContext<Self>) -> bool {
        match effect {
            KeyEffect::Ignored => return false,
            KeyEffect::Handled => {}
            KeyEffect::VideoChanged => self.after_video_changed(cx),
            KeyEffect::CommentsOpened => self.open_comments(cx),
            KeyEffect::FullscreenToggled => cx.toggle_fullscreen(),
            KeyEffect::Send(request) => self.send_comment(request, cx),
            KeyEffect::OpenVideo(video_id) => self.open_linked_video(video_id, cx),
        }
        self.take_session_notice(cx);
        cx.notify();
        true
    }

    fn on_key_down(&mut self, event: &KeyDownEvent, cx: &mut ViewContext<Self>) {
        let keystroke = &event.keystroke;
        let modifiers = &keystroke.modifiers;
        if modifiers.control || modifiers.platform || modifiers.alt {
            return;
        }

        let typed = typed_text(keystroke);
        let effect = self.session.handle_key(&keystroke.key, typed.as_deref());
        if self.handle_effect(effect, cx) {
            cx.stop_propagation();
        }
    }

    fn focus_input(&mut self, focus: InputFocus, cx: &mut ViewContext<Self>) {
        self.session.focus = focus;
        self.focus_handle.focus(cx);
        cx.notify();
    }

    fn share_current(&mut self, cx: &mut ViewContext<Self>) {
        let Some(video) = self.session.current_video() else {
            return;
        };
        match share::share_link(video) {
            Ok(link) => {
                let text = format!("{}\n{}", share::share_text(video), link);
                cx.write_to_clipboard(ClipboardItem::new_string(text));
                self.show_notice("分享链接已复制", cx);
            }
            Err(e) => log::error!("failed to build share link: {e}"),
        }
    }

    fn open_current_in_browser(&mut self) {
        let Some(video) = self.session.current_video() else {
            return;
        };
        match share::share_link(video) {
            Ok(link) => {
                if let Err(e) = open::that(link.as_str()) {
                    log::error!("failed to open {link}: {e}");
                }
            }
            Err(e) => log::error!("failed to build share link: {e}"),
        }
    }

    fn reply_target_name(&self) -> Option<String> {
        let target = self.session.comments.reply_to()?;
        self.session
            .comments
            .comments()
            .iter()
            .flat_map(|c| std::iter::once(c).chain(c.replies.iter()))
            .find(|c| c.id == target)
            .map(|c| c.user.name.clone())
    }
}

/// Text a keystroke types into a focused input, if any.
fn typed_text(keystroke: &Keystroke) -> Option<String> {
    if keystroke.key == "space" {
        return Some(" ".to_string());
    }
    let mut chars = keystroke.key.chars();
    let ch = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    if keystroke.modifiers.shift {
        Some(ch.to_uppercase().collect())
    } else {
        Some(ch.to_string())
    }
}

impl Render for AppState {
    fn render(&mut self, cx: &mut ViewContext<Self>) -> impl IntoElement {
        let theme = &self.theme;

        div()
            .size_full()
            .flex()
            .flex_row()
            .bg(theme.bg_primary)
            .text_color(theme.text_primary)
            .font_family(".SystemUIFont")
            .track_focus(&self.focus_handle)
            .on_key_down(cx.listener(Self::on_key_down))
            // Sidebar
            .child(self.render_sidebar())
            // Feed
            .child(self.render_main_column(cx))
            // Comments
            .when(self.session.comments_open, |this| {
                this.child(self.render_comment_drawer(cx))
            })
    }
}

impl AppState {
    fn render_sidebar(&self) -> impl IntoElement {
        let theme = &self.theme;
        let position = self
            .session
            .feed
            .as_ref()
            .map(|feed| format!("{}/{}", feed.current_index() + 1, feed.len()));

        div()
            .w(px(SIDEBAR_WIDTH))
            .h_full()
            .flex()
            .flex_col()
            .items_center()
            .gap_3()
            .bg(theme.bg_secondary)
            .border_r_1()
            .border_color(theme.border_subtle)
            // 顶部留空给 traffic lights
            .child(div().h(px(TITLEBAR_HEIGHT)).w_full().flex_shrink_0())
            .child(
                div()
                    .mt_2()
                    .w(px(40.))
                    .h(px(40.))
                    .flex()
                    .items_center()
                    .justify_center()
                    .rounded_lg()
                    .bg(theme.accent)
                    .text_color(hsla(0., 0., 1., 1.0))
                    .text_lg()
                    .font_weight(FontWeight::BOLD)
                    .child("抖"),
            )
            .when_some(position, |this, position| {
                this.child(
                    div()
                        .text_xs()
                        .text_color(theme.text_muted)
                        .child(position),
                )
            })
    }

    fn render_main_column(&self, cx: &mut ViewContext<Self>) -> impl IntoElement {
        let theme = &self.theme;

        div()
            .flex_1()
            .h_full()
            .min_w(px(0.))
            .flex()
            .flex_col()
            .child(
                div()
                    .w_full()
                    .h(px(TITLEBAR_HEIGHT + 48.))
                    .flex()
                    .flex_col()
                    .border_b_1()
                    .border_color(theme.border_subtle)
                    .child(div().h(px(TITLEBAR_HEIGHT)).w_full().flex_shrink_0())
                    .child(
                        div()
                            .flex_1()
                            .flex()
                            .items_center()
                            .justify_center()
                            .px_4()
                            .child(self.render_search_bar(cx)),
                    ),
            )
            .when_some(self.error_message.clone(), |this, msg| {
                this.child(
                    div()
                        .w_full()
                        .px_4()
                        .py_2()
                        .bg(theme.error)
                        .text_color(hsla(0., 0., 1., 1.0))
                        .text_sm()
                        .child(msg),
                )
            })
            .child(self.render_stage(cx))
    }

    fn render_search_bar(&self, cx: &mut ViewContext<Self>) -> impl IntoElement {
        let theme = &self.theme;
        let focused = self.session.focus == InputFocus::Search;
        let query = self.session.search_input.clone();
        let history = self.session.search.entries().to_vec();

        div()
            .relative()
            .w(px(420.))
            .flex()
            .items_center()
            .gap_2()
            .child(
                div()
                    .id("search-box")
                    .flex_1()
                    .h(px(34.))
                    .px_4()
                    .flex()
                    .items_center()
                    .rounded_full()
                    .bg(theme.bg_tertiary)
                    .border_1()
                    .border_color(if focused {
                        theme.accent
                    } else {
                        theme.border_subtle
                    })
                    .text_sm()
                    .cursor_text()
                    .on_click(cx.listener(|this, _event, cx| {
                        this.focus_input(InputFocus::Search, cx);
                    }))
                    .child(render_input_text(theme, &query, "搜索你感兴趣的视频", focused)),
            )
            .child(
                div()
                    .id("search-submit")
                    .px_3()
                    .py_1()
                    .rounded_full()
                    .text_sm()
                    .text_color(theme.text_secondary)
                    .cursor_pointer()
                    .hover(|s| s.text_color(hsla(0., 0., 1., 1.0)))
                    .on_click(cx.listener(|this, _event, cx| {
                        this.submit_search(cx);
                    }))
                    .child("搜索"),
            )
            .when(focused, |this| {
                this.child(self.render_search_history(history, cx))
            })
    }

    fn render_search_history(
        &self,
        history: Vec<String>,
        cx: &mut ViewContext<Self>,
    ) -> impl IntoElement {
        let theme = &self.theme;

        let rows: Vec<AnyElement> = history
            .into_iter()
            .enumerate()
            .map(|(ix, entry)| {
                let pick = entry.clone();
                let remove = entry.clone();
                div()
                    .id(ElementId::Name(format!("history-{}", ix).into()))
                    .w_full()
                    .px_4()
                    .py_2()
                    .flex()
                    .items_center()
                    .justify_between()
                    .text_sm()
                    .cursor_pointer()
                    .hover(|s| s.bg(theme.bg_hover))
                    .on_click(cx.listener(move |this, _event, cx| {
                        this.session.search_input = pick.clone();
                        this.submit_search(cx);
                    }))
                    .child(entry)
                    .child(
                        div()
                            .id(ElementId::Name(format!("history-remove-{}", ix).into()))
                            .text_xs()
                            .text_color(theme.text_muted)
                            .on_click(cx.listener(move |this, _event, cx| {
                                cx.stop_propagation();
                                this.session.search.remove(&remove);
                                cx.notify();
                            }))
                            .child("✕"),
                    )
                    .into_any_element()
            })
            .collect();
        let is_empty = rows.is_empty();

        div()
            .absolute()
            .top(px(40.))
            .left_0()
            .w(px(360.))
            .py_2()
            .flex()
            .flex_col()
            .rounded_lg()
            .bg(theme.bg_secondary)
            .border_1()
            .border_color(theme.border)
            .shadow_lg()
            .child(
                div()
                    .px_4()
                    .py_1()
                    .flex()
                    .justify_between()
                    .text_xs()
                    .text_color(theme.text_muted)
                    .child("搜索历史")
                    .when(!is_empty, |this| {
                        this.child(
                            div()
                                .id("history-clear")
                                .cursor_pointer()
                                .on_click(cx.listener(|this, _event, cx| {
                                    this.session.search.clear();
                                    cx.notify();
                                }))
                                .child("清空"),
                        )
                    }),
            )
            .when(is_empty, |this| {
                this.child(
                    div()
                        .px_4()
                        .py_3()
                        .text_sm()
                        .text_color(theme.text_muted)
                        .child("暂无搜索历史"),
                )
            })
            .children(rows)
    }

    fn render_stage(&self, cx: &mut ViewContext<Self>) -> AnyElement {
        let theme = &self.theme;

        let Some(video) = self.session.current_video() else {
            let label = if self.is_loading_feed {
                "⏳ 加载中…"
            } else {
                "暂无视频"
            };
            return div()
                .flex_1()
                .w_full()
                .flex()
                .items_center()
                .justify_center()
                .text_color(theme.text_muted)
                .child(label)
                .into_any_element();
        };

        let playback = &self.session.playback;
        let paused = !playback.is_playing() && !playback.has_ended();

        div()
            .id("stage")
            .flex_1()
            .w_full()
            .min_h(px(0.))
            .relative()
            .overflow_hidden()
            .bg(hsla(0., 0., 0., 1.0))
            .on_click(cx.listener(|this, _event, cx| {
                this.session.focus = InputFocus::None;
                this.run_action(ShortcutAction::TogglePlay, cx);
            }))
            .child(
                img(video.cover_url.clone())
                    .size_full()
                    .object_fit(ObjectFit::Contain),
            )
            .when(paused, |this| {
                this.child(
                    div()
                        .absolute()
                        .inset_0()
                        .flex()
                        .items_center()
                        .justify_center()
                        .text_size(px(64.))
                        .text_color(hsla(0., 0., 1., 0.8))
                        .child("▶"),
                )
            })
            .when_some(playback.error().map(str::to_string), |this, error| {
                this.child(
                    div()
                        .absolute()
                        .inset_0()
                        .flex()
                        .flex_col()
                        .items_center()
                        .justify_center()
                        .gap_2()
                        .bg(theme.bg_overlay)
                        .child("视频加载失败")
                        .child(div().text_xs().text_color(theme.text_muted).child(error)),
                )
            })
            .when(!self.session.clear_screen, |this| {
                this.child(
                    div()
                        .absolute()
                        .left_0()
                        .bottom(px(64.))
                        .max_w(px(520.))
                        .p_4()
                        .child(views::render_video_info(theme, video)),
                )
                .child(
                    div()
                        .absolute()
                        .right_4()
                        .bottom(px(80.))
                        .child(self.render_interactions(cx)),
                )
            })
            .child(
                div()
                    .absolute()
                    .left_0()
                    .right_0()
                    .bottom_0()
                    .flex()
                    .flex_col()
                    .child(views::render_progress_bar(theme, playback.progress() as f32))
                    .child(self.render_controls(cx)),
            )
            .when_some(self.notice.clone(), |this, notice| {
                this.child(
                    div()
                        .absolute()
                        .top_4()
                        .left_0()
                        .right_0()
                        .flex()
                        .justify_center()
                        .child(
                            div()
                                .px_4()
                                .py_2()
                                .rounded_lg()
                                .bg(theme.bg_overlay)
                                .text_sm()
                                .child(notice),
                        ),
                )
            })
            .into_any_element()
    }

    fn render_interactions(&self, cx: &mut ViewContext<Self>) -> impl IntoElement {
        let theme = &self.theme;
        let Some(video) = self.session.current_video() else {
            return div();
        };
        let interactions = &self.session.interactions;
        let liked = interactions.is_liked(&video.id);
        let favorited = interactions.is_favorited(&video.id);
        let followed = interactions.is_followed(&video.author.id);

        div()
            .flex()
            .flex_col()
            .items_center()
            .gap_5()
            .child(
                div()
                    .relative()
                    .child(views::render_avatar(&video.author.avatar, 48.))
                    .child(
                        div()
                            .id("follow")
                            .absolute()
                            .bottom(px(-8.))
                            .left(px(14.))
                            .w(px(20.))
                            .h(px(20.))
                            .flex()
                            .items_center()
                            .justify_center()
                            .rounded_full()
                            .text_xs()
                            .cursor_pointer()
                            .bg(if followed { theme.bg_tertiary } else { theme.accent })
                            .on_click(cx.listener(|this, _event, cx| {
                                cx.stop_propagation();
                                this.session.toggle_follow();
                                cx.notify();
                            }))
                            .child(if followed { "✓" } else { "+" }),
                    ),
            )
            .child(
                views::render_action(
                    theme,
                    "♥",
                    video.like_label(liked),
                    liked.then_some(theme.accent),
                )
                .id("like")
                .cursor_pointer()
                .on_click(cx.listener(|this, _event, cx| {
                    cx.stop_propagation();
                    this.session.toggle_like();
                    cx.notify();
                })),
            )
            .child(
                views::render_action(theme, "💬", self.session.comment_badge(), None)
                    .id("comments")
                    .cursor_pointer()
                    .on_click(cx.listener(|this, _event, cx| {
                        cx.stop_propagation();
                        this.toggle_comments(cx);
                    })),
            )
            .child(
                views::render_action(
                    theme,
                    "★",
                    video.favorite_label(favorited),
                    favorited.then_some(theme.favorite),
                )
                .id("favorite")
                .cursor_pointer()
                .on_click(cx.listener(|this, _event, cx| {
                    cx.stop_propagation();
                    this.session.toggle_favorite();
                    cx.notify();
                })),
            )
            .child(
                views::render_action(theme, "↗", video.share_label(), None)
                    .id("share")
                    .cursor_pointer()
                    .on_click(cx.listener(|this, _event, cx| {
                        cx.stop_propagation();
                        this.share_current(cx);
                    })),
            )
    }

    fn control_button(
        &self,
        id: &'static str,
        label: impl Into<SharedString>,
        active: bool,
    ) -> Stateful<Div> {
        let theme = &self.theme;
        let label: SharedString = label.into();

        div()
            .id(id)
            .px_2()
            .py_1()
            .rounded(px(4.))
            .text_sm()
            .cursor_pointer()
            .text_color(if active {
                theme.accent
            } else {
                theme.text_primary
            })
            .hover(|s| s.bg(hsla(0., 0., 1., 0.08)))
            .child(label)
    }

    fn render_controls(&self, cx: &mut ViewContext<Self>) -> impl IntoElement {
        let theme = &self.theme;
        let playback = &self.session.playback;
        let state = playback.state();
        let volume_icon = if state.volume > 0.0 { "🔊" } else { "🔇" };

        div()
            .w_full()
            .h(px(44.))
            .px_3()
            .flex()
            .items_center()
            .justify_between()
            .bg(theme.bg_overlay)
            .child(
                div()
                    .flex()
                    .items_center()
                    .gap_2()
                    .child(
                        self.control_button(
                            "play",
                            if playback.is_playing() { "⏸" } else { "▶" },
                            false,
                        )
                        .on_click(cx.listener(|this, _event, cx| {
                            cx.stop_propagation();
                            this.run_action(ShortcutAction::TogglePlay, cx);
                        })),
                    )
                    .child(
                        div()
                            .text_xs()
                            .text_color(theme.text_secondary)
                            .child(format!(
                                "{} / {}",
                                playback.formatted_current_time(),
                                playback.formatted_duration()
                            )),
                    ),
            )
            .child(
                div()
                    .flex()
                    .items_center()
                    .gap_1()
                    .child(
                        self.control_button("autoplay", "连播", self.session.config.autoplay)
                            .on_click(cx.listener(|this, _event, cx| {
                                cx.stop_propagation();
                                this.session.config.autoplay = !this.session.config.autoplay;
                                cx.notify();
                            })),
                    )
                    .child(
                        self.control_button("clear-screen", "清屏", self.session.clear_screen)
                            .on_click(cx.listener(|this, _event, cx| {
                                cx.stop_propagation();
                                this.session.clear_screen = !this.session.clear_screen;
                                cx.notify();
                            })),
                    )
                    .child(
                        self.control_button("rate", state.rate.label(), false)
                            .on_click(cx.listener(|this, _event, cx| {
                                cx.stop_propagation();
                                this.session.cycle_rate();
                                cx.notify();
                            })),
                    )
                    .child(
                        self.control_button(
                            "volume",
                            format!("{} {}%", volume_icon, (state.volume * 100.0).round()),
                            false,
                        )
                        .on_click(cx.listener(|this, _event, cx| {
                            cx.stop_propagation();
                            this.run_action(ShortcutAction::ToggleMute, cx);
                        })),
                    )
                    .child(
                        self.control_button(
                            "fullscreen",
                            "⛶",
                            self.session.player.is_fullscreen(),
                        )
                        .on_click(cx.listener(|this, _event, cx| {
                            cx.stop_propagation();
                            this.run_action(ShortcutAction::ToggleFullscreen, cx);
                        })),
                    )
                    .child(
                        self.control_button("open-browser", "浏览器打开", false)
                            .on_click(cx.listener(|this, _event, cx| {
                                cx.stop_propagation();
                                this.open_current_in_browser();
                            })),
                    )
                    .child(
                        self.control_button("previous", "▲", false)
                            .on_click(cx.listener(|this, _event, cx| {
                                cx.stop_propagation();
                                this.run_action(ShortcutAction::PreviousVideo, cx);
                            })),
                    )
                    .child(
                        self.control_button("next", "▼", false)
                            .on_click(cx.listener(|this, _event, cx| {
                                cx.stop_propagation();
                                this.run_action(ShortcutAction::NextVideo, cx);
                            })),
                    ),
            )
    }

    fn render_comment_drawer(&self, cx: &mut ViewContext<Self>) -> impl IntoElement {
        let theme = &self.theme;
        let store = &self.session.comments;
        let actual = store.actual_count();
        let virtual_count = store.virtual_count();

        let sort_pills: Vec<AnyElement> = [CommentSort::Hot, CommentSort::Time]
            .into_iter()
            .map(|sort| {
                let is_active = store.sort() == sort;
                div()
                    .id(ElementId::Name(format!("sort-{}", sort.label()).into()))
                    .px_3()
                    .py_1()
                    .rounded_full()
                    .text_xs()
                    .cursor_pointer()
                    .when(is_active, |this| {
                        this.bg(theme.accent).text_color(hsla(0., 0., 1., 1.0))
                    })
                    .when(!is_active, |this| this.text_color(theme.text_muted))
                    .on_click(cx.listener(move |this, _event, cx| {
                        this.session.comments.set_sort(sort);
                        cx.notify();
                    }))
                    .child(sort.label())
                    .into_any_element()
            })
            .collect();

        let rows: Vec<AnyElement> = store
            .sorted()
            .into_iter()
            .map(|comment| self.render_comment(comment, None, cx))
            .collect();

        div()
            .w(px(DRAWER_WIDTH))
            .h_full()
            .flex_shrink_0()
            .flex()
            .flex_col()
            .bg(theme.bg_secondary)
            .border_l_1()
            .border_color(theme.border_subtle)
            .child(div().h(px(TITLEBAR_HEIGHT)).w_full().flex_shrink_0())
            // Header
            .child(
                div()
                    .h(px(48.))
                    .px_5()
                    .flex()
                    .items_center()
                    .justify_between()
                    .border_b_1()
                    .border_color(theme.border_subtle)
                    .child(
                        div()
                            .flex()
                            .items_center()
                            .gap_4()
                            .child(
                                div()
                                    .flex()
                                    .items_center()
                                    .gap_1()
                                    .font_weight(FontWeight::MEDIUM)
                                    .child("评论")
                                    .child(
                                        div()
                                            .text_sm()
                                            .text_color(theme.text_muted)
                                            .child(virtual_count.to_string()),
                                    ),
                            )
                            .child(div().flex().gap_2().children(sort_pills)),
                    )
                    .child(
                        div()
                            .id("close-comments")
                            .cursor_pointer()
                            .text_color(theme.text_muted)
                            .hover(|s| s.text_color(hsla(0., 0., 1., 1.0)))
                            .on_click(cx.listener(|this, _event, cx| {
                                this.session.close_comments();
                                cx.notify();
                            }))
                            .child("✕"),
                    ),
            )
            // List
            .child(
                div()
                    .id("comment-list")
                    .flex_1()
                    .overflow_y_scroll()
                    .track_scroll(&self.comment_scroll)
                    .px_4()
                    .py_3()
                    .when(store.is_loading(), |this| {
                        this.child(
                            div()
                                .py_8()
                                .flex()
                                .justify_center()
                                .text_color(theme.text_muted)
                                .child("⏳ 加载评论…"),
                        )
                    })
                    .when(!store.is_loading(), |this| {
                        this.child(div().w_full().flex().flex_col().gap_4().children(rows))
                            .when(actual > 0 && virtual_count > actual, |this| {
                                this.child(
                                    div()
                                        .py_8()
                                        .flex()
                                        .flex_col()
                                        .items_center()
                                        .gap_1()
                                        .text_sm()
                                        .text_color(theme.text_muted)
                                        .child(format!("以上 {} 条评论", actual))
                                        .child(div().text_xs().child(format!(
                                            "还有 {} 条评论未加载",
                                            virtual_count - actual
                                        ))),
                                )
                            })
                            .when(actual == 0, |this| {
                                this.child(
                                    div()
                                        .py_8()
                                        .flex()
                                        .flex_col()
                                        .items_center()
                                        .gap_2()
                                        .text_color(theme.text_muted)
                                        .child(div().text_size(px(48.)).child("💬"))
                                        .child(div().text_sm().child("还没有评论，快来抢沙发吧~")),
                                )
                            })
                    }),
            )
            .child(self.render_composer(cx))
    }

    fn render_comment(
        &self,
        comment: &CommentRecord,
        parent_id: Option<&str>,
        cx: &mut ViewContext<Self>,
    ) -> AnyElement {
        let theme = &self.theme;
        let store = &self.session.comments;
        let is_reply = parent_id.is_some();
        let liked = store.is_comment_liked(&comment.id);
        let is_own = comment.user.id == CURRENT_USER_ID;
        let is_expanded = self.expanded_threads.contains(&comment.id);
        let reply_count = comment.replies.len();
        let action_indent = if is_reply { 80. } else { 44. };

        let like_id = comment.id.clone();
        let reply_id = comment.id.clone();
        let reply_name = comment.user.name.clone();
        let delete_id = comment.id.clone();
        let delete_parent = parent_id.map(str::to_string);
        let thread_id = comment.id.clone();

        let replies: Vec<AnyElement> = if is_expanded && !is_reply {
            comment
                .replies
                .iter()
                .map(|reply| self.render_comment(reply, Some(&comment.id), cx))
                .collect()
        } else {
            Vec::new()
        };

        div()
            .id(ElementId::Name(format!("comment-{}", comment.id).into()))
            .w_full()
            .min_w(px(0.))
            .flex_shrink_0()
            .flex()
            .flex_col()
            .gap_2()
            .child(views::render_comment_body(theme, comment, liked, is_reply))
            .child(
                div()
                    .pl(px(action_indent))
                    .flex()
                    .items_center()
                    .gap_4()
                    .text_xs()
                    .text_color(theme.text_muted)
                    .child(
                        div()
                            .id(ElementId::Name(format!("comment-like-{}", comment.id).into()))
                            .cursor_pointer()
                            .when(liked, |this| this.text_color(theme.accent))
                            .on_click(cx.listener(move |this, _event, cx| {
                                this.like_comment(&like_id, cx);
                            }))
                            .child(if liked { "已赞" } else { "赞" }),
                    )
                    .child(
                        div()
                            .id(ElementId::Name(format!("comment-reply-{}", comment.id).into()))
                            .cursor_pointer()
                            .on_click(cx.listener(move |this, _event, cx| {
                                this.session.begin_reply(&reply_id, &reply_name);
                                this.focus_handle.focus(cx);
                                cx.notify();
                            }))
                            .child("回复"),
                    )
                    .when(is_own, |this| {
                        this.child(
                            div()
                                .id(ElementId::Name(
                                    format!("comment-delete-{}", comment.id).into(),
                                ))
                                .cursor_pointer()
                                .hover(|s| s.text_color(theme.error))
                                .on_click(cx.listener(move |this, _event, cx| {
                                    this.delete_comment(&delete_id, delete_parent.as_deref(), cx);
                                }))
                                .child("删除"),
                        )
                    }),
            )
            .when(!is_reply && comment.has_replies(), |this| {
                this.child(
                    div()
                        .id(ElementId::Name(format!("comment-thread-{}", comment.id).into()))
                        .pl(px(44.))
                        .text_xs()
                        .text_color(theme.text_secondary)
                        .cursor_pointer()
                        .on_click(cx.listener(move |this, _event, cx| {
                            this.toggle_thread(&thread_id, cx);
                        }))
                        .child(if is_expanded {
                            "收起回复".to_string()
                        } else {
                            format!("展开 {} 条回复", reply_count)
                        }),
                )
            })
            .children(replies)
            .into_any_element()
    }

    fn render_composer(&self, cx: &mut ViewContext<Self>) -> impl IntoElement {
        let theme = &self.theme;
        let store = &self.session.comments;
        let focused = self.session.focus == InputFocus::Comment;
        let reply_name = self.reply_target_name();
        let can_send = !store.input().trim().is_empty() && !store.is_sending();

        div()
            .border_t_1()
            .border_color(theme.border_subtle)
            .when_some(reply_name.clone(), |this, name| {
                this.child(
                    div()
                        .px_4()
                        .pt_3()
                        .pb_2()
                        .flex()
                        .items_center()
                        .justify_between()
                        .bg(theme.bg_tertiary)
                        .text_sm()
                        .child(
                            div()
                                .flex()
                                .gap_1()
                                .text_color(theme.text_secondary)
                                .child("回复")
                                .child(
                                    div()
                                        .text_color(hsla(198., 0.88, 0.51, 1.0))
                                        .child(format!("@{}", name)),
                                ),
                        )
                        .child(
                            div()
                                .id("cancel-reply")
                                .text_xs()
                                .text_color(theme.text_muted)
                                .cursor_pointer()
                                .on_click(cx.listener(|this, _event, cx| {
                                    this.session.comments.cancel_reply();
                                    this.session.comments.set_input("");
                                    cx.notify();
                                }))
                                .child("取消"),
                        ),
                )
            })
            .child(
                div()
                    .p_4()
                    .flex()
                    .flex_col()
                    .gap_2()
                    .child(
                        div()
                            .flex()
                            .items_center()
                            .gap_3()
                            .child(views::render_avatar(
                                "https://api.dicebear.com/7.x/avataaars/svg?seed=current",
                                36.,
                            ))
                            .child(
                                div()
                                    .id("comment-input")
                                    .flex_1()
                                    .min_w(px(0.))
                                    .px_4()
                                    .py_2()
                                    .rounded_full()
                                    .bg(theme.bg_tertiary)
                                    .border_1()
                                    .border_color(if focused {
                                        theme.accent
                                    } else {
                                        theme.bg_tertiary
                                    })
                                    .text_sm()
                                    .cursor_text()
                                    .on_click(cx.listener(|this, _event, cx| {
                                        this.focus_input(InputFocus::Comment, cx);
                                    }))
                                    .child(render_input_text(
                                        theme,
                                        store.input(),
                                        "说点什么...",
                                        focused,
                                    )),
                            )
                            .child(
                                div()
                                    .id("comment-send")
                                    .px_5()
                                    .py_2()
                                    .rounded_full()
                                    .text_sm()
                                    .font_weight(FontWeight::MEDIUM)
                                    .when(can_send, |this| {
                                        this.bg(theme.accent)
                                            .text_color(hsla(0., 0., 1., 1.0))
                                            .cursor_pointer()
                                            .hover(|s| s.bg(theme.accent_hover))
                                            .on_click(cx.listener(|this, _event, cx| {
                                                this.submit_comment(cx);
                                            }))
                                    })
                                    .when(!can_send, |this| {
                                        this.bg(theme.bg_tertiary)
                                            .text_color(theme.text_muted)
                                    })
                                    .child(if store.is_sending() {
                                        "发送中"
                                    } else {
                                        "发布"
                                    }),
                            ),
                    )
                    .child(
                        div()
                            .ml(px(48.))
                            .text_xs()
                            .text_color(theme.text_muted)
                            .child(if reply_name.is_some() {
                                "按 Enter 发送，Esc 取消回复"
                            } else {
                                "按 Enter 发送"
                            }),
                    ),
            )
    }
}

fn render_input_text(theme: &Theme, text: &str, placeholder: &str, focused: bool) -> Div {
    let content = div().flex().items_center().overflow_hidden().whitespace_nowrap();
    if text.is_empty() && !focused {
        return content
            .text_color(theme.text_muted)
            .child(placeholder.to_string());
    }
    content
        .text_color(theme.text_primary)
        .child(text.to_string())
        .when(focused, |this| {
            this.child(div().w(px(1.)).h(px(16.)).bg(theme.accent))
        })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    let storage = Storage::on_disk(config.data_dir.clone());
    log::info!("storing state in {:?}", config.data_dir);

    App::new()
        .with_http_client(Arc::new(ReqwestClient::new()))
        .run(move |cx: &mut AppContext| {
            let options = WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                    None,
                    size(px(1280.), px(820.)),
                    cx,
                ))),
                titlebar: Some(TitlebarOptions {
                    title: Some("ShortFeed".into()),
                    appears_transparent: true,
                    traffic_light_position: Some(point(px(12.), px(12.))),
                }),
                ..Default::default()
            };

            let window = cx.open_window(options, move |cx| {
                cx.new_view(move |cx| {
                    let mut state = AppState::new(config, storage, cx);
                    state.load_feed(cx);
                    state.start_playback_clock(cx);
                    state.focus_handle.focus(cx);
                    state
                })
            });
            if let Err(e) = window {
                log::error!("failed to open window: {e}");
            }
        });
}
