//! Page-number pagination for list endpoints.
//!
//! Lists answer with `{count, next, previous, results}`. Clients pick a page
//! with `?page=N` (or `?page=last`) and may ask for a different page size
//! with `?page_size=M`, which is capped at the paginator's maximum.

use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};

use crate::app::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    pub page_size: i64,
    pub max_page_size: i64,
}

pub const BLOG_PAGES: Paginator = Paginator {
    page_size: 10,
    max_page_size: 100,
};

pub const COMMENT_PAGES: Paginator = Paginator {
    page_size: 5,
    max_page_size: 50,
};

/// Raw query parameters, kept as strings so bad values can be handled the
/// way pagination wants instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// The page that was resolved from the parameters and the collection size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub size: i64,
    pub num_pages: i64,
    /// Whether the client chose the size, links then repeat it
    pub explicit_size: bool,
}

impl PageWindow {
    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }
}

impl Paginator {
    /// A `page_size` that is not a positive integer is ignored; one above the
    /// maximum is clamped to it.
    pub fn page_size(&self, params: &PageParams) -> Option<i64> {
        params
            .page_size
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|size| *size > 0)
            .map(|size| size.min(self.max_page_size))
    }

    /// Resolves the requested page against a collection of `count` items.
    /// There is always at least one page, even for an empty collection.
    pub fn window(&self, params: &PageParams, count: i64) -> Result<PageWindow, AppError> {
        let explicit = self.page_size(params);
        let size = explicit.unwrap_or(self.page_size);
        let num_pages = ((count + size - 1) / size).max(1);

        let number = match params.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw.parse::<i64>().map_err(|_| AppError::NotFound)?,
        };
        if number < 1 || number > num_pages {
            return Err(AppError::NotFound);
        }

        Ok(PageWindow {
            number,
            size,
            num_pages,
            explicit_size: explicit.is_some(),
        })
    }

    /// Builds the page envelope. `load` receives `(limit, offset)` and
    /// returns the already rendered results for that slice.
    pub fn paginate<T, F>(
        &self,
        req: &HttpRequest,
        params: &PageParams,
        count: i64,
        load: F,
    ) -> Result<Page<T>, AppError>
    where
        F: FnOnce(i64, i64) -> Result<Vec<T>, AppError>,
    {
        let window = self.window(params, count)?;
        let results = load(window.limit(), window.offset())?;

        let info = req.connection_info();
        let base = format!("{}://{}{}", info.scheme(), info.host(), req.path());

        let next = (window.number < window.num_pages).then(|| page_link(&base, window.number + 1, &window));
        let previous = (window.number > 1).then(|| page_link(&base, window.number - 1, &window));

        Ok(Page {
            count,
            next,
            previous,
            results,
        })
    }
}

/// Link to page `number`, the first page is linked without a `page` parameter.
fn page_link(base: &str, number: i64, window: &PageWindow) -> String {
    let mut query = Vec::new();
    if number > 1 {
        query.push(format!("page={number}"));
    }
    if window.explicit_size {
        query.push(format!("page_size={}", window.size));
    }

    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", query.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;
    use pretty_assertions::assert_eq;

    use super::*;

    fn params(page: Option<&str>, page_size: Option<&str>) -> PageParams {
        PageParams {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    #[test]
    fn page_size_is_clamped_and_bad_values_ignored() {
        assert_eq!(BLOG_PAGES.page_size(&params(None, Some("100"))), Some(100));
        assert_eq!(BLOG_PAGES.page_size(&params(None, Some("200"))), Some(100));
        assert_eq!(COMMENT_PAGES.page_size(&params(None, Some("80"))), Some(50));
        assert_eq!(BLOG_PAGES.page_size(&params(None, Some("0"))), None);
        assert_eq!(BLOG_PAGES.page_size(&params(None, Some("-3"))), None);
        assert_eq!(BLOG_PAGES.page_size(&params(None, Some("ten"))), None);
        assert_eq!(BLOG_PAGES.page_size(&params(None, None)), None);
    }

    #[test]
    fn window_resolves_numbers_and_last() {
        let window = BLOG_PAGES.window(&params(Some("2"), None), 25).unwrap();
        assert_eq!((window.number, window.size, window.num_pages), (2, 10, 3));
        assert_eq!((window.limit(), window.offset()), (10, 10));

        let window = BLOG_PAGES.window(&params(Some("last"), Some("20")), 25).unwrap();
        assert_eq!((window.number, window.size, window.num_pages), (2, 20, 2));

        let window = COMMENT_PAGES.window(&params(None, None), 0).unwrap();
        assert_eq!((window.number, window.num_pages), (1, 1));
    }

    #[test]
    fn invalid_pages_are_not_found() {
        for page in ["0", "-1", "4", "two"] {
            assert!(matches!(
                BLOG_PAGES.window(&params(Some(page), None), 25),
                Err(AppError::NotFound)
            ));
        }
    }

    #[test]
    fn links_carry_page_and_explicit_size() {
        let req = TestRequest::get()
            .uri("/blogs/?page=2&page_size=5")
            .insert_header(("host", "api.test"))
            .to_http_request();

        let page = BLOG_PAGES
            .paginate(&req, &params(Some("2"), Some("5")), 12, |limit, offset| {
                Ok((offset..offset + limit).take(12 - offset as usize).collect::<Vec<_>>())
            })
            .unwrap();

        assert_eq!(page.count, 12);
        assert_eq!(page.results, vec![5, 6, 7, 8, 9]);
        assert_eq!(
            page.next.as_deref(),
            Some("http://api.test/blogs/?page=3&page_size=5")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://api.test/blogs/?page_size=5")
        );
    }

    #[test]
    fn single_page_has_no_links() {
        let req = TestRequest::get().uri("/comments/").to_http_request();

        let page = COMMENT_PAGES
            .paginate(&req, &params(None, None), 3, |_, _| Ok(vec!["a", "b", "c"]))
            .unwrap();

        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
    }
}
