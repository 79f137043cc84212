//! SQL issued against the `articles` table. The table itself is owned by the CMS.

/// Published articles, newest first. Binds: row limit.
pub const LIST_PUBLISHED: &str = r#"
SELECT id, title, slug, body, is_published, created
FROM articles
WHERE is_published = 1
ORDER BY created DESC
LIMIT ?
"#;

/// One article with every optional column. Binds: article id.
pub const GET_BY_ID: &str = r#"
SELECT id, user_id, title, slug, body, markdown, is_published, created, modified
FROM articles
WHERE id = ?
"#;
