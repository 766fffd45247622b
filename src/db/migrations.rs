//! Database migrations
//!
//! Schema changes are embedded in the binary as SQL strings and applied in
//! version order. Applied versions are tracked in the `_migrations` table.
//!
//! ```ignore
//! use laxmi::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config.database).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::DynDatabasePool;

/// A schema migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number (unique, ascending)
    pub version: i32,
    pub name: &'static str,
    /// One or more `;`-separated SQLite statements
    pub up_sqlite: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_admin_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS admin_users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                display_name VARCHAR(100) NOT NULL,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'editor'
                    CHECK (role IN ('super_admin', 'admin', 'editor')),
                is_active BOOLEAN NOT NULL DEFAULT 1,
                last_login TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_admin_users_email ON admin_users(email);
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES admin_users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_blog_authors",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS blog_authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                slug VARCHAR(100) NOT NULL UNIQUE,
                role_en VARCHAR(100) NOT NULL DEFAULT '',
                role_it VARCHAR(100) NOT NULL DEFAULT '',
                bio_en TEXT,
                bio_it TEXT,
                avatar_url TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_blog_categories",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS blog_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name_en VARCHAR(100) NOT NULL,
                name_it VARCHAR(100) NOT NULL,
                slug VARCHAR(100) NOT NULL UNIQUE,
                description_en TEXT,
                description_it TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_blog_categories_sort ON blog_categories(sort_order);
        "#,
    },
    Migration {
        version: 5,
        name: "create_blog_posts",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS blog_posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(200) NOT NULL UNIQUE,
                title_en VARCHAR(255) NOT NULL,
                title_it VARCHAR(255) NOT NULL,
                excerpt_en TEXT NOT NULL DEFAULT '',
                excerpt_it TEXT NOT NULL DEFAULT '',
                content_en TEXT NOT NULL DEFAULT '',
                content_it TEXT NOT NULL DEFAULT '',
                tags_en TEXT NOT NULL DEFAULT '[]',
                tags_it TEXT NOT NULL DEFAULT '[]',
                featured_image TEXT,
                featured_image_alt_en TEXT,
                featured_image_alt_it TEXT,
                author_id INTEGER,
                category_id INTEGER,
                reading_time INTEGER NOT NULL DEFAULT 5,
                schema_type VARCHAR(20) NOT NULL DEFAULT 'BlogPosting',
                seo_title_en TEXT,
                seo_title_it TEXT,
                seo_description_en TEXT,
                seo_description_it TEXT,
                seo_keywords_en TEXT NOT NULL DEFAULT '[]',
                seo_keywords_it TEXT NOT NULL DEFAULT '[]',
                status VARCHAR(20) NOT NULL DEFAULT 'draft'
                    CHECK (status IN ('draft', 'published', 'archived')),
                featured BOOLEAN NOT NULL DEFAULT 0,
                published_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                created_by INTEGER,
                updated_by INTEGER,
                FOREIGN KEY (author_id) REFERENCES blog_authors(id) ON DELETE SET NULL,
                FOREIGN KEY (category_id) REFERENCES blog_categories(id) ON DELETE SET NULL,
                FOREIGN KEY (created_by) REFERENCES admin_users(id) ON DELETE SET NULL,
                FOREIGN KEY (updated_by) REFERENCES admin_users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_blog_posts_status ON blog_posts(status);
            CREATE INDEX IF NOT EXISTS idx_blog_posts_published_at ON blog_posts(published_at);
            CREATE INDEX IF NOT EXISTS idx_blog_posts_category ON blog_posts(category_id);
        "#,
    },
    Migration {
        version: 6,
        name: "create_blog_post_faqs",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS blog_post_faqs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                question_en TEXT NOT NULL DEFAULT '',
                question_it TEXT NOT NULL DEFAULT '',
                answer_en TEXT NOT NULL DEFAULT '',
                answer_it TEXT NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (post_id) REFERENCES blog_posts(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_blog_post_faqs_post ON blog_post_faqs(post_id, sort_order);
        "#,
    },
    Migration {
        version: 7,
        name: "create_blog_related_posts",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS blog_related_posts (
                post_id INTEGER NOT NULL,
                related_post_id INTEGER NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (post_id, related_post_id),
                FOREIGN KEY (post_id) REFERENCES blog_posts(id) ON DELETE CASCADE,
                FOREIGN KEY (related_post_id) REFERENCES blog_posts(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 8,
        name: "create_gallery_images",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS gallery_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                image_url TEXT NOT NULL,
                image_path TEXT NOT NULL DEFAULT '',
                title_en VARCHAR(255) NOT NULL,
                title_it VARCHAR(255) NOT NULL,
                category_en VARCHAR(100) NOT NULL,
                category_it VARCHAR(100) NOT NULL,
                alt_en TEXT NOT NULL DEFAULT '',
                alt_it TEXT NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_gallery_images_sort ON gallery_images(sort_order);
        "#,
    },
    Migration {
        version: 9,
        name: "create_site_content",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS site_content (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_key VARCHAR(255) NOT NULL UNIQUE,
                section VARCHAR(100) NOT NULL,
                content_en TEXT NOT NULL DEFAULT '',
                content_it TEXT NOT NULL DEFAULT '',
                content_type VARCHAR(20) NOT NULL DEFAULT 'text'
                    CHECK (content_type IN ('text', 'richtext', 'html', 'json')),
                description TEXT,
                is_array BOOLEAN NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_by INTEGER,
                FOREIGN KEY (updated_by) REFERENCES admin_users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_site_content_section ON site_content(section, sort_order);
            CREATE TABLE IF NOT EXISTS content_sections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                section_key VARCHAR(100) NOT NULL UNIQUE,
                display_name_en VARCHAR(100) NOT NULL,
                display_name_it VARCHAR(100) NOT NULL,
                description TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0
            );
            INSERT OR IGNORE INTO content_sections (section_key, display_name_en, display_name_it, sort_order) VALUES
                ('metadata', 'Metadata', 'Metadati', 0),
                ('nav', 'Navigation', 'Navigazione', 1),
                ('hero', 'Hero', 'Hero', 2),
                ('values', 'Philosophy', 'Filosofia', 3),
                ('services', 'Services', 'Servizi', 4),
                ('gallery', 'Gallery', 'Galleria', 5),
                ('cta', 'Call to Action', 'Invito all''azione', 6),
                ('footer', 'Footer', 'Piè di pagina', 7),
                ('booking', 'Booking', 'Prenotazione', 8),
                ('common', 'Common', 'Comuni', 9),
                ('collections', 'Collections', 'Collezioni', 10),
                ('consulting', 'Consulting', 'Consulenza', 11),
                ('contactPage', 'Contact Page', 'Pagina Contatti', 12),
                ('aboutPage', 'About Page', 'Pagina Chi Siamo', 13),
                ('cookies', 'Cookie Banner', 'Banner Cookie', 14),
                ('blog', 'Blog', 'Blog', 15),
                ('legal', 'Legal Pages', 'Pagine Legali', 16),
                ('notFound', 'Error Pages', 'Pagine di Errore', 17);
        "#,
    },
    Migration {
        version: 10,
        name: "create_admin_activity_log",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS admin_activity_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                admin_id INTEGER,
                action VARCHAR(50) NOT NULL,
                entity_type VARCHAR(50) NOT NULL,
                entity_id VARCHAR(100),
                old_value TEXT,
                new_value TEXT,
                ip_address VARCHAR(64),
                user_agent TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (admin_id) REFERENCES admin_users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_activity_created_at ON admin_activity_log(created_at);
        "#,
    },
    Migration {
        version: 11,
        name: "create_newsletter_subscribers",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS newsletter_subscribers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                locale VARCHAR(5) NOT NULL DEFAULT 'it',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
];

/// Run all pending migrations in version order.
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool.sqlite())
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

/// Apply one migration and record it, all inside a transaction
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.sqlite().begin().await?;

    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, skipping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Number of migrations not yet applied
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;
    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

pub fn get_migration(version: i32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    async fn insert_admin(pool: &DynDatabasePool) -> i64 {
        sqlx::query(
            "INSERT INTO admin_users (email, display_name, password_hash, role) VALUES (?, ?, ?, ?)",
        )
        .bind("owner@laxmi.it")
        .bind("Owner")
        .bind("hash123")
        .bind("super_admin")
        .execute(pool.sqlite())
        .await
        .expect("Failed to create admin")
        .last_insert_rowid()
    }

    async fn insert_post(pool: &DynDatabasePool, slug: &str) -> i64 {
        sqlx::query("INSERT INTO blog_posts (slug, title_en, title_it) VALUES (?, ?, ?)")
            .bind(slug)
            .bind("Title")
            .bind("Titolo")
            .execute(pool.sqlite())
            .await
            .expect("Failed to create post")
            .last_insert_rowid()
    }

    async fn count(pool: &DynDatabasePool, table: &str) -> i64 {
        let row = sqlx::query(&format!("SELECT COUNT(*) as count FROM {}", table))
            .fetch_one(pool.sqlite())
            .await
            .expect("Failed to count");
        row.get("count")
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_is_up_to_date() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert!(!is_up_to_date(&pool).await.expect("Failed to check"));
        assert_eq!(pending_count(&pool).await.expect("Failed to check"), MIGRATIONS.len());

        run_migrations(&pool).await.expect("Failed to run migrations");
        assert!(is_up_to_date(&pool).await.expect("Failed to check"));
        assert_eq!(pending_count(&pool).await.expect("Failed to check"), 0);
    }

    #[tokio::test]
    async fn test_admin_role_constraint() {
        let pool = migrated_pool().await;
        insert_admin(&pool).await;

        let result = sqlx::query(
            "INSERT INTO admin_users (email, display_name, password_hash, role) VALUES (?, ?, ?, ?)",
        )
        .bind("other@laxmi.it")
        .bind("Other")
        .bind("hash")
        .bind("author")
        .execute(pool.sqlite())
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_faqs_and_related_cascade_with_post() {
        let pool = migrated_pool().await;
        let post = insert_post(&pool, "first").await;
        let other = insert_post(&pool, "second").await;

        sqlx::query("INSERT INTO blog_post_faqs (post_id, question_en) VALUES (?, 'Q?')")
            .bind(post)
            .execute(pool.sqlite())
            .await
            .expect("Failed to insert FAQ");
        sqlx::query("INSERT INTO blog_related_posts (post_id, related_post_id) VALUES (?, ?)")
            .bind(other)
            .bind(post)
            .execute(pool.sqlite())
            .await
            .expect("Failed to insert related post");

        sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(post)
            .execute(pool.sqlite())
            .await
            .expect("Failed to delete post");

        assert_eq!(count(&pool, "blog_post_faqs").await, 0);
        assert_eq!(count(&pool, "blog_related_posts").await, 0);
    }

    #[tokio::test]
    async fn test_post_slug_unique() {
        let pool = migrated_pool().await;
        insert_post(&pool, "same").await;

        let result = sqlx::query("INSERT INTO blog_posts (slug, title_en, title_it) VALUES (?, ?, ?)")
            .bind("same")
            .bind("T")
            .bind("T")
            .execute(pool.sqlite())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_session_removed_with_admin() {
        let pool = migrated_pool().await;
        let admin = insert_admin(&pool).await;

        sqlx::query(
            "INSERT INTO sessions (id, user_id, expires_at) VALUES (?, ?, datetime('now', '+7 day'))",
        )
        .bind("token")
        .bind(admin)
        .execute(pool.sqlite())
        .await
        .expect("Failed to insert session");

        sqlx::query("DELETE FROM admin_users WHERE id = ?")
            .bind(admin)
            .execute(pool.sqlite())
            .await
            .expect("Failed to delete admin");

        assert_eq!(count(&pool, "sessions").await, 0);
    }

    #[tokio::test]
    async fn test_content_sections_seeded() {
        let pool = migrated_pool().await;
        assert_eq!(count(&pool, "content_sections").await, 18);
    }

    #[test]
    fn test_get_migration() {
        assert_eq!(get_migration(1).map(|m| m.name), Some("create_admin_users"));
        assert!(get_migration(999).is_none());
    }

    #[test]
    fn test_migration_versions_ascending() {
        for pair in MIGRATIONS.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT);\n-- comment only;\nCREATE INDEX i ON a(id);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements, vec!["CREATE TABLE a (id INT)", "CREATE INDEX i ON a(id)"]);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- a\n  -- b"));
        assert!(!is_comment_only("-- a\nSELECT 1"));
    }

    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1"), "SELECT 1");
        let long = "x".repeat(150);
        assert_eq!(truncate_sql(&long).len(), 103);
    }
}
