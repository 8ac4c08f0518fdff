//! Sample posts.
//!
//! Used to seed a fresh local store and as the last-resort answer for list
//! reads when every store comes back empty.

use chrono::{DateTime, TimeZone, Utc};

use crate::post::{BlogPost, PostStatus};

struct SamplePost {
    id: &'static str,
    title: &'static str,
    slug: &'static str,
    excerpt: &'static str,
    content: &'static str,
    status: PostStatus,
    category: &'static str,
    date: (i32, u32, u32),
}

const AUTHOR: &str = "The Firm";

const SAMPLES: &[SamplePost] = &[
    SamplePost {
        id: "sample-estate-planning",
        title: "Why Every Family Needs an Estate Plan",
        slug: "why-every-family-needs-an-estate-plan",
        excerpt: "A will is only the beginning. Here is what a complete estate plan covers.",
        content: "<p>Estate planning is not just for the wealthy. A complete plan names \
                  guardians for minor children, directs how assets pass, and appoints \
                  people you trust to make decisions if you cannot.</p>",
        status: PostStatus::Published,
        category: "Estate Planning",
        date: (2024, 1, 15),
    },
    SamplePost {
        id: "sample-probate",
        title: "Probate in Plain English",
        slug: "probate-in-plain-english",
        excerpt: "What the court process after a death involves and how long it takes.",
        content: "<p>Probate is the court-supervised process of validating a will, \
                  paying debts and distributing what remains. Most estates close \
                  within a year.</p>",
        status: PostStatus::Published,
        category: "Probate",
        date: (2024, 2, 20),
    },
    SamplePost {
        id: "sample-business-formation",
        title: "Choosing the Right Structure for Your Small Business",
        slug: "choosing-the-right-structure-for-your-small-business",
        excerpt: "Sole proprietorship, LLC or corporation: the trade-offs at a glance.",
        content: "<p>The entity you form affects your personal liability, your taxes \
                  and how easily you can bring on partners.</p>",
        status: PostStatus::Draft,
        category: "Business Law",
        date: (2024, 3, 5),
    },
];

fn at_nine(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

/// The fixed sample dataset, newest first.
#[must_use]
pub fn sample_posts() -> Vec<BlogPost> {
    let mut posts: Vec<BlogPost> = SAMPLES
        .iter()
        .map(|s| {
            let (y, m, d) = s.date;
            let created = at_nine(y, m, d);
            BlogPost {
                id: s.id.to_string(),
                title: s.title.to_string(),
                slug: s.slug.to_string(),
                excerpt: s.excerpt.to_string(),
                content: s.content.to_string(),
                status: s.status,
                author: AUTHOR.to_string(),
                category: s.category.to_string(),
                publish_date: created.date_naive(),
                created_at: created,
                updated_at: created,
                views: 0,
                image_url: None,
                image_alt: None,
                meta_title: None,
                meta_description: None,
            }
        })
        .collect();
    crate::post::sort_newest_first(&mut posts);
    posts
}
