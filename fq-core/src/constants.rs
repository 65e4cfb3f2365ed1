/// открывающий разделитель кадра
pub const FRAME_OPEN: u8 = b'(';

/// Терминатор кадра: кадр завершён, как только прочитан этот байт
pub const FRAME_CLOSE: u8 = b')';

/// Метод пакетного запроса котировок
pub const METHOD_QUOTES: &str = "alphavantage";

/// Метод запроса курса валют
pub const METHOD_CURRENCY: &str = "currency";

/// Валюта по умолчанию, если суффикс тикера не распознан
pub const DEFAULT_CURRENCY: &str = "USD";

/// Суффиксы бирж -> валюта котировки
pub const SUFFIX_CURRENCIES: &[(&str, &str)] = &[(".DE", "EUR"), (".AMS", "EUR"), (".AS", "EUR")];

/// Время суток, которое хост получает вместе с датой котировки
pub const QUOTE_WALL_CLOCK: &str = "12:00:00";
