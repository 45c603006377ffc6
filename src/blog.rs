//! Blog catalogue
//!
//! The posts are fixed content shipped with the client. The listing page
//! filters them by category and a free-text search; each post page carries
//! its own SEO title, description and structured data.

use serde_json::{json, Value};

pub const BLOG_TITLE: &str = "Trade Pilot Blog - Expert Home Improvement Tips & Guides";
pub const BLOG_DESCRIPTION: &str = "Get expert home improvement tips, tradesperson advice, and project guides from Trade Pilot. Your ultimate resource for DIY projects and finding trusted professionals.";
pub const ALL_POSTS: &str = "All Posts";

pub const CATEGORIES: &[&str] = &[
    ALL_POSTS,
    "Home Renovation",
    "Plumbing",
    "Electrical",
    "General",
    "Landscaping",
    "Heating",
    "Roofing",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlogPost {
    pub id: u32,
    pub title: &'static str,
    pub excerpt: &'static str,
    pub author: &'static str,
    pub date: &'static str,
    pub read_time: &'static str,
    pub category: &'static str,
    pub featured: bool,
}

impl BlogPost {
    pub fn seo_title(&self) -> String {
        format!("{} | Trade Pilot Blog", self.title)
    }

    pub fn seo_description(&self) -> &'static str {
        self.excerpt
    }

    /// schema.org `Article` markup.
    pub fn structured_data(&self) -> Value {
        json!({
            "@context": "https://schema.org",
            "@type": "Article",
            "headline": self.title,
            "description": self.excerpt,
            "author": { "@type": "Person", "name": self.author },
            "datePublished": self.date,
            "publisher": { "@type": "Organization", "name": "Trade Pilot" }
        })
    }
}

pub const POSTS: &[BlogPost] = &[
    BlogPost {
        id: 1,
        title: "The Complete Guide to Kitchen Renovation: From Planning to Completion",
        excerpt: "Transform your kitchen with our comprehensive guide covering everything from initial planning to final touches. Learn from industry experts.",
        author: "Sarah Mitchell",
        date: "January 15, 2025",
        read_time: "12 min read",
        category: "Home Renovation",
        featured: true,
    },
    BlogPost {
        id: 2,
        title: "10 Signs You Need an Emergency Plumber",
        excerpt: "Don't wait for a small leak to become a major flood. Learn the warning signs that require immediate professional attention.",
        author: "Mike Thompson",
        date: "January 12, 2025",
        read_time: "5 min read",
        category: "Plumbing",
        featured: false,
    },
    BlogPost {
        id: 3,
        title: "Electrical Safety: What Every Homeowner Should Know",
        excerpt: "Stay safe with our essential electrical safety guide. Learn when to DIY and when to call a professional electrician.",
        author: "David Lee",
        date: "January 10, 2025",
        read_time: "7 min read",
        category: "Electrical",
        featured: false,
    },
    BlogPost {
        id: 4,
        title: "How to Choose the Right Tradesperson for Your Project",
        excerpt: "Find trusted professionals with confidence. Our expert tips for vetting, comparing quotes, and ensuring quality work.",
        author: "Emma Wilson",
        date: "January 8, 2025",
        read_time: "6 min read",
        category: "General",
        featured: false,
    },
    BlogPost {
        id: 5,
        title: "Garden Landscaping Trends for 2025",
        excerpt: "Discover the latest garden design trends that will transform your outdoor space into a beautiful retreat.",
        author: "James Green",
        date: "January 5, 2025",
        read_time: "8 min read",
        category: "Landscaping",
        featured: false,
    },
    BlogPost {
        id: 6,
        title: "Bathroom Renovation on a Budget: Smart Tips",
        excerpt: "Achieve a stunning bathroom makeover without breaking the bank. Professional tips for maximum impact on minimum budget.",
        author: "Lisa Parker",
        date: "January 3, 2025",
        read_time: "9 min read",
        category: "Home Renovation",
        featured: false,
    },
    BlogPost {
        id: 7,
        title: "Central Heating Maintenance: Essential Winter Prep",
        excerpt: "Keep your home warm and energy-efficient this winter. Expert tips for maintaining your heating system and reducing energy bills.",
        author: "Tom Richardson",
        date: "December 30, 2024",
        read_time: "6 min read",
        category: "Heating",
        featured: false,
    },
];

pub fn featured() -> Option<&'static BlogPost> {
    POSTS.iter().find(|p| p.featured)
}

/// Looks a post up by the `:id` segment of `/blog/:id`.
pub fn find(id: &str) -> Option<&'static BlogPost> {
    let id: u32 = id.trim().parse().ok()?;
    POSTS.iter().find(|p| p.id == id)
}

/// Up to three other posts, same category first, then newest.
pub fn related(post: &BlogPost) -> Vec<&'static BlogPost> {
    if post.id == 1 {
        return [2, 3, 6]
            .iter()
            .filter_map(|id| POSTS.iter().find(|p| p.id == *id))
            .collect();
    }
    let others = POSTS.iter().filter(|p| p.id != post.id);
    let same = others.clone().filter(|p| p.category == post.category);
    let rest = others.filter(|p| p.category != post.category);
    same.chain(rest).take(3).collect()
}

/// The listing page's filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogFilter {
    pub category: String,
    pub search: String,
}

impl Default for BlogFilter {
    fn default() -> Self {
        Self {
            category: ALL_POSTS.to_string(),
            search: String::new(),
        }
    }
}

impl BlogFilter {
    pub fn matches(&self, post: &BlogPost) -> bool {
        let category = self.category == ALL_POSTS || post.category == self.category;
        let needle = self.search.to_lowercase();
        let search = post.title.to_lowercase().contains(&needle)
            || post.excerpt.to_lowercase().contains(&needle);
        category && search
    }

    /// Listed posts; the featured post has its own slot above the list.
    pub fn apply(&self) -> Vec<&'static BlogPost> {
        POSTS
            .iter()
            .filter(|p| !p.featured)
            .filter(|p| self.matches(p))
            .collect()
    }
}
