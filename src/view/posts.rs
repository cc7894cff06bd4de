use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::posts::{Post, PostPage};
use crate::subscription::http::QueryResult;

use super::spinner_frame;

const FALLBACK_ERROR: &str = "Failed to load posts";
const MAX_TAGS: usize = 3;

/// Which panel the posts view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Panel<'a> {
    /// Nothing to show yet. Also used before the first fetch starts.
    Loading,
    /// The last fetch failed after its retries.
    Error(String),
    /// Data is available. `refreshing` is set during a background refetch.
    Success {
        page: &'a PostPage,
        refreshing: bool,
    },
}

impl<'a> Panel<'a> {
    /// Picks the panel for a query projection.
    ///
    /// A failure wins over cached data; cached data wins over a fetch in
    /// flight.
    pub fn of(result: &'a QueryResult<PostPage>) -> Self {
        if result.is_error() {
            let message = result
                .error()
                .map(ToString::to_string)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_ERROR.to_string());
            return Panel::Error(message);
        }

        match result.data() {
            Some(page) => Panel::Success {
                page,
                refreshing: result.is_fetching(),
            },
            None => Panel::Loading,
        }
    }
}

/// The posts panel.
#[derive(Debug, Clone, Copy)]
pub struct PostsView<'a> {
    result: &'a QueryResult<PostPage>,
    scroll: u16,
    tick: usize,
}

impl<'a> PostsView<'a> {
    pub const fn new(result: &'a QueryResult<PostPage>) -> Self {
        Self {
            result,
            scroll: 0,
            tick: 0,
        }
    }

    /// Rows of the post list scrolled off the top.
    #[must_use]
    pub const fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    /// Spinner animation frame.
    #[must_use]
    pub const fn tick(mut self, tick: usize) -> Self {
        self.tick = tick;
        self
    }

    fn render_loading(&self, area: Rect, buf: &mut Buffer) {
        let line = Line::from(vec![
            Span::styled(spinner_frame(self.tick), Style::default().fg(Color::Blue)),
            Span::raw(" Loading posts..."),
        ]);
        Paragraph::new(vec![Line::default(), line.centered()])
            .block(panel_block(" Posts "))
            .render(area, buf);
    }

    fn render_error(message: &str, area: Rect, buf: &mut Buffer) {
        let lines = vec![
            Line::default(),
            Line::from("Oops! Something went wrong".red().bold()).centered(),
            Line::from(message.to_string().gray()).centered(),
            Line::default(),
            Line::from(vec!["[t]".blue().bold(), " Try Again".into()]).centered(),
        ];
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(panel_block(" Posts "))
            .render(area, buf);
    }

    fn render_success(&self, page: &PostPage, refreshing: bool, area: Rect, buf: &mut Buffer) {
        let block = panel_block(" Posts from API ");
        let inner = block.inner(area);
        block.render(area, buf);

        let [header, list] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

        let mut summary = vec![Span::raw(format!("Total posts: {}", page.total))];
        if refreshing {
            summary.push(Span::raw("  "));
            summary.push(Span::styled(
                format!("{} refreshing...", spinner_frame(self.tick)),
                Style::default().fg(Color::Blue),
            ));
        }
        Paragraph::new(Line::from(summary).centered()).render(header, buf);

        let lines: Vec<Line> = page.posts.iter().flat_map(card).collect();
        let max_scroll = u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX);

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .scroll((self.scroll.min(max_scroll), 0))
            .render(list, buf);
    }
}

impl Widget for PostsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match Panel::of(self.result) {
            Panel::Loading => self.render_loading(area, buf),
            Panel::Error(message) => Self::render_error(&message, area, buf),
            Panel::Success { page, refreshing } => {
                self.render_success(page, refreshing, area, buf);
            }
        }
    }
}

fn panel_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().add_modifier(Modifier::BOLD))
}

/// The lines making up one post card, followed by a blank separator.
fn card(post: &Post) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            format!("User {}", post.user_id).dark_gray(),
            "  ".into(),
            format!("#{}", post.id).dark_gray(),
        ]),
        Line::from(post.title.clone().bold()),
        Line::from(post.body.clone()),
    ];

    if !post.tags.is_empty() {
        let tags: Vec<Span> = post
            .tags
            .iter()
            .take(MAX_TAGS)
            .flat_map(|tag| [format!("[{tag}]").blue(), " ".into()])
            .collect();
        lines.push(Line::from(tags));
    }

    lines.push(Line::from(vec![
        format!("Likes: {}", post.reactions.likes).red(),
        "  ".into(),
        format!("Dislikes: {}", post.reactions.dislikes).gray(),
    ]));
    lines.push(Line::default());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::Reactions;
    use crate::subscription::http::{QueryError, QueryStatus};
    use crate::view::test_support::{contains, render_lines};

    fn page() -> PostPage {
        PostPage {
            posts: vec![Post {
                id: 1,
                title: "T".to_string(),
                body: "x".to_string(),
                user_id: 5,
                tags: ["history", "crime", "love", "fiction"]
                    .map(String::from)
                    .to_vec(),
                reactions: Reactions {
                    likes: 2,
                    dislikes: 0,
                },
            }],
            total: 251,
            skip: 0,
            limit: 30,
        }
    }

    fn with_status(status: QueryStatus, data: Option<PostPage>) -> QueryResult<PostPage> {
        QueryResult {
            status,
            data,
            ..QueryResult::idle()
        }
    }

    #[test]
    fn test_panel_selection() {
        let idle = QueryResult::idle();
        assert_eq!(Panel::of(&idle), Panel::Loading);

        let loading = with_status(QueryStatus::Loading, None);
        assert_eq!(Panel::of(&loading), Panel::Loading);

        let refreshing = with_status(QueryStatus::Loading, Some(page()));
        assert!(matches!(
            Panel::of(&refreshing),
            Panel::Success {
                refreshing: true,
                ..
            }
        ));

        let failed = QueryResult {
            error: Some(QueryError::Status(500)),
            ..with_status(QueryStatus::Error, Some(page()))
        };
        assert_eq!(
            Panel::of(&failed),
            Panel::Error("Request failed with status code 500".to_string())
        );
    }

    #[test]
    fn test_error_without_message_falls_back() {
        let failed = with_status(QueryStatus::Error, None);
        assert_eq!(Panel::of(&failed), Panel::Error(FALLBACK_ERROR.to_string()));
    }

    #[test]
    fn test_renders_loading_panel() {
        let result = with_status(QueryStatus::Loading, None);
        let lines = render_lines(PostsView::new(&result), 60, 6);
        assert!(contains(&lines, "Loading posts..."));
        assert!(!contains(&lines, "Posts from API"));
    }

    #[test]
    fn test_renders_error_panel() {
        let result = QueryResult {
            error: Some(QueryError::NetworkError("connection refused".to_string())),
            ..with_status(QueryStatus::Error, None)
        };
        let lines = render_lines(PostsView::new(&result), 60, 10);

        assert!(contains(&lines, "Oops! Something went wrong"));
        assert!(contains(&lines, "connection refused"));
        assert!(contains(&lines, "Try Again"));
    }

    #[test]
    fn test_renders_post_cards() {
        let result = with_status(QueryStatus::Success, Some(page()));
        let lines = render_lines(PostsView::new(&result), 60, 12);

        assert!(contains(&lines, "Posts from API"));
        assert!(contains(&lines, "Total posts: 251"));
        assert!(contains(&lines, "User 5"));
        assert!(contains(&lines, "#1"));
        assert!(contains(&lines, "[history] [crime] [love]"));
        assert!(!contains(&lines, "fiction"), "only three tags are shown");
        assert!(contains(&lines, "Likes: 2"));
        assert!(contains(&lines, "Dislikes: 0"));
        assert!(!contains(&lines, "refreshing"));
    }

    #[test]
    fn test_background_refetch_keeps_list() {
        let result = with_status(QueryStatus::Loading, Some(page()));
        let lines = render_lines(PostsView::new(&result), 60, 12);

        assert!(contains(&lines, "refreshing..."));
        assert!(contains(&lines, "User 5"));
        assert!(!contains(&lines, "Loading posts..."));
    }

    #[test]
    fn test_scroll_moves_list() {
        let result = with_status(QueryStatus::Success, Some(page()));
        let lines = render_lines(PostsView::new(&result).scroll(1), 60, 12);
        assert!(!contains(&lines, "User 5"));
        assert!(contains(&lines, "Total posts: 251"), "header does not scroll");

        let lines = render_lines(PostsView::new(&result).scroll(u16::MAX), 60, 12);
        assert!(!contains(&lines, "Likes: 2"), "clamped to the last row");
    }
}
