use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Параметры пагинации списка.
///
/// Параметр попадает в query string только если он задан и не равен нулю:
/// `page=0` трактуется так же, как отсутствие параметра.
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_size: Option<u32>,
}

impl PageQuery {
    /// Собирает параметры, отбрасывая отсутствующие и нулевые значения.
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.filter(|v| *v > 0),
            page_size: page_size.filter(|v| *v > 0),
        }
    }

    /// Номер страницы, который уйдёт на сервер.
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// Размер страницы, который уйдёт на сервер.
    pub fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    /// Не осталось ни одного параметра.
    pub fn is_empty(&self) -> bool {
        self.page.is_none() && self.page_size.is_none()
    }
}
